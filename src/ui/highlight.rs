use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::ui::unescape_html;
use crate::ui::view::Element;

const CODE_OPEN: &str = "<pre><code";
const CODE_CLOSE: &str = "</code></pre>";
const HIGHLIGHTED_OPEN: &str = "<pre class=\"highlighted\">";

/// Highlights code blocks inside one element. Running it again over an
/// element it already processed must leave the markup unchanged.
pub trait SyntaxHighlighter: Send + Sync {
    fn highlight(&self, element: &mut Element);

    /// Stylesheet the highlighted markup relies on, if any.
    fn stylesheet(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl SyntaxHighlighter for PlainHighlighter {
    fn highlight(&self, _element: &mut Element) {}
}

// Streaming re-renders the same finished code blocks on every chunk, so
// highlighted blocks are cached by (language, code hash).
struct SimpleCache {
    map: HashMap<(String, u64), String>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, key: &(String, u64)) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: (String, u64), value: String) {
        if !self.map.contains_key(&key) {
            self.order.push_back(key.clone());
        }
        self.map.insert(key, value);
        while self.map.len() > self.cap {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

pub struct SyntectHighlighter {
    theme_name: String,
    cache: Mutex<SimpleCache>,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new("InspiredGitHub")
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn hash_code(lang: &str, code: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    hasher.finish()
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

/// Splits `<pre><code class="language-x">` into its language hint.
fn language_from_attrs(attrs: &str) -> &str {
    attrs
        .trim()
        .strip_prefix("class=\"language-")
        .and_then(|rest| rest.split('"').next())
        .unwrap_or("")
}

/// Offsets of the opening tag's `>` and of the closing `</code></pre>` for a
/// block starting at the beginning of `block`.
fn locate_block(block: &str) -> Option<(usize, usize)> {
    let tag_end = block[CODE_OPEN.len()..].find('>')? + CODE_OPEN.len();
    let close = block.find(CODE_CLOSE)?;
    (close > tag_end).then_some((tag_end, close))
}

impl SyntectHighlighter {
    pub fn new(theme_name: impl Into<String>) -> Self {
        Self {
            theme_name: theme_name.into(),
            cache: Mutex::new(SimpleCache::new(64)),
        }
    }

    fn highlight_code(&self, lang_hint: &str, code: &str) -> Option<String> {
        let lang = normalize_lang_hint(lang_hint);
        if lang.is_empty() {
            return None;
        }
        let key = (lang.clone(), hash_code(&lang, code));
        if let Some(hit) = self.cache.lock().ok().and_then(|cache| cache.get(&key)) {
            return Some(hit);
        }

        let ps = syntax_set();
        let syntax = ps.find_syntax_by_token(&lang)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, ps, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .ok()?;
        }
        let html = generator.finalize();

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, html.clone());
        }
        Some(html)
    }

    /// Rewrites every unprocessed code block in `markup`. Returns `None` when
    /// nothing changed.
    fn highlight_markup(&self, markup: &str) -> Option<String> {
        if !markup.contains(CODE_OPEN) {
            return None;
        }

        let mut out = String::with_capacity(markup.len() * 2);
        let mut rest = markup;
        let mut changed = false;

        while let Some(start) = rest.find(CODE_OPEN) {
            out.push_str(&rest[..start]);
            rest = &rest[start..];
            let Some((tag_end, close)) = locate_block(rest) else {
                break;
            };
            let block = rest;

            let attrs = &block[CODE_OPEN.len()..tag_end];
            let lang = language_from_attrs(attrs);
            let code = unescape_html(&block[tag_end + 1..close]);
            match self.highlight_code(lang, &code) {
                Some(html) => {
                    out.push_str(HIGHLIGHTED_OPEN);
                    out.push_str("<code");
                    out.push_str(attrs);
                    out.push('>');
                    out.push_str(&html);
                    out.push_str(CODE_CLOSE);
                    changed = true;
                }
                None => out.push_str(&block[..close + CODE_CLOSE.len()]),
            }
            rest = &block[close + CODE_CLOSE.len()..];
        }
        out.push_str(rest);

        changed.then_some(out)
    }
}

impl SyntaxHighlighter for SyntectHighlighter {
    fn highlight(&self, element: &mut Element) {
        if let Some(markup) = self.highlight_markup(&element.markup) {
            element.markup = markup;
        }
    }

    fn stylesheet(&self) -> Option<String> {
        let theme = theme_set()
            .themes
            .get(&self.theme_name)
            .or_else(|| theme_set().themes.get("InspiredGitHub"))?;
        css_for_theme_with_class_style(theme, ClassStyle::Spaced).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::SlotId;

    fn element(markup: &str) -> Element {
        let mut element = Element::for_slot(SlotId::new(1));
        element.markup = markup.to_string();
        element
    }

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("JS"), "javascript");
        assert_eq!(normalize_lang_hint("yml"), "yaml");
        assert_eq!(normalize_lang_hint("rs"), "rust");
    }

    #[test]
    fn highlights_fenced_rust_block() {
        let highlighter = SyntectHighlighter::default();
        let mut el = element(
            "<p>x</p>\n<pre><code class=\"language-rust\">fn main() { let a = 1 &lt; 2; }\n</code></pre>\n",
        );
        highlighter.highlight(&mut el);
        assert!(el.markup.starts_with("<p>x</p>\n<pre class=\"highlighted\"><code class=\"language-rust\">"));
        assert!(el.markup.contains("<span class=\""));
        assert!(el.markup.contains("&lt;"));
        assert!(el.markup.ends_with("</code></pre>\n"));
    }

    #[test]
    fn highlighting_twice_is_a_noop() {
        let highlighter = SyntectHighlighter::default();
        let mut el = element("<pre><code class=\"language-python\">print(1)\n</code></pre>\n");
        highlighter.highlight(&mut el);
        let once = el.markup.clone();
        highlighter.highlight(&mut el);
        assert_eq!(el.markup, once);
    }

    #[test]
    fn unlabelled_and_unknown_blocks_are_left_alone() {
        let highlighter = SyntectHighlighter::default();
        let markup = "<pre><code>plain\n</code></pre>\n<pre><code class=\"language-nope-lang\">x\n</code></pre>\n";
        let mut el = element(markup);
        highlighter.highlight(&mut el);
        assert_eq!(el.markup, markup);
    }

    #[test]
    fn unterminated_block_is_left_alone() {
        let highlighter = SyntectHighlighter::default();
        let markup = "<pre><code class=\"language-rust\">fn main(";
        let mut el = element(markup);
        highlighter.highlight(&mut el);
        assert_eq!(el.markup, markup);
    }

    #[test]
    fn cache_evicts_oldest_entries() {
        let mut cache = SimpleCache::new(2);
        cache.put(("a".into(), 1), "1".into());
        cache.put(("b".into(), 2), "2".into());
        cache.put(("c".into(), 3), "3".into());
        assert!(cache.get(&("a".into(), 1)).is_none());
        assert_eq!(cache.get(&("c".into(), 3)).as_deref(), Some("3"));
    }

    #[test]
    fn stylesheet_is_available_for_default_theme() {
        let css = SyntectHighlighter::default().stylesheet().expect("css");
        assert!(css.contains('{'));
    }
}
