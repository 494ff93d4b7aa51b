//! Source-text pre-processing
//!
//! Every source text is cleaned before inference and re-wrapped after:
//! leading and trailing whitespace runs are preserved around the
//! translation, soft hyphens are stripped, and for CJK sources a space is
//! inserted between a full-width terminator and an immediately following
//! double quote (which also becomes a left double quote) so the sentence
//! splitter sees a boundary.

use anuvaad_core::language::is_han;

const SOFT_HYPHEN: char = '\u{00AD}';
const CJK_TERMINATORS: [char; 3] = ['。', '！', '？'];

/// Cleaned text plus the whitespace runs needed to re-wrap the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanText {
    pub before: String,
    pub after: String,
    pub cleaned: String,
}

impl CleanText {
    /// Re-attach the preserved whitespace around a translation.
    pub fn rewrap(&self, translated: &str) -> String {
        format!("{}{}{}", self.before, translated, self.after)
    }
}

fn needs_cjk_spacing(source_language: &str) -> bool {
    matches!(source_language, "ja" | "ko" | "zh") || is_han(source_language)
}

/// Clean one source text for the given source language.
pub fn clean_source_text(text: &str, source_language: &str) -> CleanText {
    let trimmed_start = text.trim_start();
    let before = text[..text.len() - trimmed_start.len()].to_string();

    let trimmed = trimmed_start.trim_end();
    let after = trimmed_start[trimmed.len()..].to_string();

    let mut cleaned = String::with_capacity(trimmed.len());
    let mut prev: Option<char> = None;
    for c in trimmed.chars() {
        if c == SOFT_HYPHEN {
            continue;
        }
        if c == '"'
            && needs_cjk_spacing(source_language)
            && prev.is_some_and(|p| CJK_TERMINATORS.contains(&p))
        {
            cleaned.push(' ');
            cleaned.push('\u{201C}');
            prev = Some('\u{201C}');
            continue;
        }
        cleaned.push(c);
        prev = Some(c);
    }

    CleanText {
        before,
        after,
        cleaned,
    }
}
