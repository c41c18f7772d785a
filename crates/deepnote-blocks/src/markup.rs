//! Markdown for presentation blocks.
//!
//! Each text cell variant has a fixed marker. [`emit_markup`] escapes the
//! text and prepends the marker; [`strip_markup`] removes it again with an
//! anchored match and trims the rest.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DeepnoteError, DeepnoteResult};
use crate::escape::{escape_html_attribute, escape_markdown, sanitize_alignment, sanitize_width};
use crate::model::Block;

static H1_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+").expect("valid regex"));
static H2_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\s+").expect("valid regex"));
// Older documents used up to six `#` for the smallest heading.
static H3_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{3,6}\s+").expect("valid regex"));
static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s+").expect("valid regex"));
static TODO_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s+\[[ xX]\]\s+").expect("valid regex"));
static CALLOUT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^>\s+").expect("valid regex"));

fn unsupported(block: &Block) -> DeepnoteError {
    DeepnoteError::UnsupportedBlockType(block.block_type().to_string())
}

/// Markdown for a presentation block.
pub fn emit_markup(block: &Block) -> DeepnoteResult<String> {
    let text = block.content();
    let markup = match block {
        Block::Markdown(_) => text.to_string(),
        Block::Heading1(_) => format!("# {}", escape_markdown(text)),
        Block::Heading2(_) => format!("## {}", escape_markdown(text)),
        Block::Heading3(_) => format!("### {}", escape_markdown(text)),
        Block::Paragraph(_) => escape_markdown(text),
        Block::Bullet(_) => format!("- {}", escape_markdown(text)),
        Block::Todo(b) => {
            let mark = if b.metadata.fields.checked.unwrap_or(false) { "x" } else { " " };
            format!("- [{}] {}", mark, escape_markdown(text))
        }
        Block::Callout(_) => format!("> {}", escape_markdown(text)),
        Block::Separator(_) => "<hr>".to_string(),
        Block::Image(b) => {
            let fields = &b.metadata.fields;
            format!(
                "<img src=\"{}\" width=\"{}\" align=\"{}\" />",
                escape_html_attribute(fields.deepnote_img_src.as_deref().unwrap_or_default()),
                sanitize_width(fields.deepnote_img_width.as_deref().unwrap_or_default()),
                sanitize_alignment(fields.deepnote_img_alignment.as_deref().unwrap_or_default()),
            )
        }
        _ => return Err(unsupported(block)),
    };
    Ok(markup)
}

/// Plain text of a presentation block with its marker removed.
pub fn strip_markup(block: &Block) -> DeepnoteResult<String> {
    let text = block.content();
    let marker: &Regex = match block {
        Block::Markdown(_) => return Ok(text.to_string()),
        Block::Separator(_) => return Ok(String::new()),
        Block::Paragraph(_) => return Ok(text.trim().to_string()),
        Block::Heading1(_) => &*H1_MARKER,
        Block::Heading2(_) => &*H2_MARKER,
        Block::Heading3(_) => &*H3_MARKER,
        Block::Bullet(_) => &*BULLET_MARKER,
        Block::Todo(_) => &*TODO_MARKER,
        Block::Callout(_) => &*CALLOUT_MARKER,
        _ => return Err(unsupported(block)),
    };
    Ok(marker.replace(text, "").trim().to_string())
}
