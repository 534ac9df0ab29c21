//! `sillage transcripts ...`: stored transcripts outside a chat.

use std::error::Error;

use crate::cli::TranscriptAction;
use crate::core::config::{path_display, Config};
use crate::core::transcripts::{FileTranscriptStore, TranscriptError, TranscriptStore};

pub fn run_transcripts(config: &Config, action: &TranscriptAction) -> Result<(), Box<dyn Error>> {
    let mut store = FileTranscriptStore::new(config.transcripts_dir()?);

    match action {
        TranscriptAction::List => {
            let names = store.list_keys()?;
            if names.is_empty() {
                println!("No saved transcripts in {}", path_display(store.dir()));
            }
            for name in names {
                println!("{name}");
            }
        }
        TranscriptAction::Show { name } => {
            let text = store
                .get(name)?
                .ok_or_else(|| TranscriptError::NotFound(name.clone()))?;
            println!("{text}");
        }
        TranscriptAction::Delete { name } => {
            if !store.remove(name)? {
                return Err(TranscriptError::NotFound(name.clone()).into());
            }
            println!("✅ Deleted transcript '{name}'");
        }
    }
    Ok(())
}
