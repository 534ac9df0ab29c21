use async_trait::async_trait;

use crate::ui::view::Element;

/// Typesets math inside a single element. Must be safe to call repeatedly
/// on the same element.
#[async_trait]
pub trait MathTypesetter: Send + Sync {
    async fn typeset(&self, element: &mut Element);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTypesetter;

#[async_trait]
impl MathTypesetter for NoopTypesetter {
    async fn typeset(&self, _element: &mut Element) {}
}

/// Wraps `$...$` and `$$...$$` found in text nodes into
/// `<span class="math inline">\(...\)</span>` and
/// `<span class="math display">\[...\]</span>`, the delimiters MathJax and
/// KaTeX auto-render pick up in the browser. Code and existing math spans
/// are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimiterTypesetter;

#[async_trait]
impl MathTypesetter for DelimiterTypesetter {
    async fn typeset(&self, element: &mut Element) {
        if let Some(markup) = typeset_markup(&element.markup) {
            element.markup = markup;
        }
    }
}

fn typeset_markup(markup: &str) -> Option<String> {
    if !markup.contains('$') {
        return None;
    }

    let mut out = String::with_capacity(markup.len() + 64);
    let mut rest = markup;
    let mut code_depth = 0usize;
    let mut in_math = false;
    let mut changed = false;

    while !rest.is_empty() {
        let text_end = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..text_end];
        match (code_depth == 0 && !in_math).then(|| wrap_math(text)).flatten() {
            Some(wrapped) => {
                out.push_str(&wrapped);
                changed = true;
            }
            None => out.push_str(text),
        }
        rest = &rest[text_end..];
        if rest.is_empty() {
            break;
        }

        let tag_end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if tag.starts_with("<code") || tag.starts_with("<pre") {
            code_depth += 1;
        } else if tag.starts_with("</code") || tag.starts_with("</pre") {
            code_depth = code_depth.saturating_sub(1);
        } else if tag.starts_with("<span class=\"math") {
            in_math = true;
        } else if in_math && tag.starts_with("</span") {
            in_math = false;
        }
        out.push_str(tag);
        rest = &rest[tag_end..];
    }

    changed.then_some(out)
}

fn wrap_math(text: &str) -> Option<String> {
    if !text.contains('$') {
        return None;
    }

    let mut out = String::with_capacity(text.len() + 48);
    let mut rest = text;
    let mut changed = false;

    while let Some(pos) = rest.find('$') {
        let display = rest[pos..].starts_with("$$");
        let delim = if display { "$$" } else { "$" };
        let inner_start = pos + delim.len();
        let closing = rest[inner_start..].find(delim);

        let inner = closing.map(|len| &rest[inner_start..inner_start + len]);
        let accepted = match inner {
            Some(inner) if display => !inner.trim().is_empty(),
            // `$5 and $10` is prose, not math.
            Some(inner) => {
                !inner.is_empty()
                    && !inner.starts_with(char::is_whitespace)
                    && !inner.ends_with(char::is_whitespace)
            }
            None => false,
        };

        match (accepted, inner) {
            (true, Some(inner)) => {
                out.push_str(&rest[..pos]);
                if display {
                    out.push_str("<span class=\"math display\">\\[");
                    out.push_str(inner);
                    out.push_str("\\]</span>");
                } else {
                    out.push_str("<span class=\"math inline\">\\(");
                    out.push_str(inner);
                    out.push_str("\\)</span>");
                }
                rest = &rest[inner_start + inner.len() + delim.len()..];
                changed = true;
            }
            _ => {
                out.push_str(&rest[..inner_start]);
                rest = &rest[inner_start..];
            }
        }
    }
    out.push_str(rest);

    changed.then_some(out)
}
