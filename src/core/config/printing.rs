use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset, using {})", self.base_url()),
        }
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset, using {})", self.model()),
        }
        match self.max_tokens {
            Some(tokens) => println!("  max-tokens: {tokens}"),
            None => println!("  max-tokens: (unset, using {})", self.max_tokens()),
        }
        match self.context {
            Some(policy) => println!("  context: {}", policy.as_str()),
            None => println!("  context: (unset, using {})", self.context_policy().as_str()),
        }
        match self.transcripts_dir() {
            Ok(dir) if self.transcripts_dir.is_some() => {
                println!("  transcripts-dir: {}", path_display(dir))
            }
            Ok(dir) => println!("  transcripts-dir: (unset, using {})", path_display(dir)),
            Err(err) => println!("  transcripts-dir: ({err})"),
        }
    }
}
