//! Prompt Builder & Truncator.
//!
//! Bounds the JD and resume text independently and embeds both into the fixed
//! screening template. Pure and deterministic: same inputs, same prompt.

pub mod prompts;

use crate::models::screening::{ExtractedText, JobDescription};
use crate::prompting::prompts::{SCREENING_PROMPT_TEMPLATE, STRICT_SUFFIX, TRUNCATION_MARKER};

/// Default per-text character budget.
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Builds the user prompt for one resume.
pub fn build_prompt(jd: &JobDescription, resume: &ExtractedText, max_chars: usize) -> String {
    let jd_text = truncate(&neutralize_tags(&jd.text), max_chars);
    let resume_text = truncate(&neutralize_tags(&resume.text), max_chars);
    // Resume first so a JD containing the placeholder text cannot be re-expanded.
    SCREENING_PROMPT_TEMPLATE
        .replace("{resume_text}", &resume_text)
        .replacen("{jd_text}", &jd_text, 1)
}

/// Section tags that delimit the texts inside the prompt.
const SECTION_TAGS: [(&str, &str); 4] = [
    ("<JD>", "[JD]"),
    ("</JD>", "[/JD]"),
    ("<RESUME>", "[RESUME]"),
    ("</RESUME>", "[/RESUME]"),
];

/// Rewrites literal section tags so user text cannot open or close a section.
/// Replacements have the same length, so truncation budgets are unaffected.
fn neutralize_tags(text: &str) -> String {
    SECTION_TAGS
        .iter()
        .fold(text.to_string(), |acc, (tag, plain)| acc.replace(tag, plain))
}

/// The prompt used for the re-ask after a malformed answer.
pub fn strict_prompt(prompt: &str) -> String {
    format!("{prompt}\n{STRICT_SUFFIX}")
}

/// Keeps the beginning of `text` so that the result, marker included, is at most
/// `max_chars` characters. Text already within budget is returned unchanged.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
