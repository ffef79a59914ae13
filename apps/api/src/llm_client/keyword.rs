//! Offline keyword-coverage backend.
//!
//! Pure-Rust, fast, deterministic and network-free. It reads the `<JD>` and `<RESUME>`
//! sections out of the screening prompt and answers with the same JSON shape a model
//! would, so the rest of the pipeline cannot tell the difference.
//!
//! Algorithm:
//! 1. Build a keyword inventory from the JD (non-stopword tokens, by frequency).
//! 2. A keyword is covered when the resume contains the same token.
//! 3. final_score = Σ(frequency of covered) / Σ(frequency) × 100
//! 4. hard_filter_pass when the score reaches `PASS_THRESHOLD`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::json;

use crate::llm_client::{LlmError, ScoringBackend};

const MAX_KEYWORDS: usize = 40;
const PASS_THRESHOLD: u32 = 50;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "both", "but", "by", "can", "candidate", "etc", "experience", "for", "from", "has", "have",
    "in", "including", "into", "is", "it", "its", "job", "least", "looking", "more", "must",
    "of", "on", "or", "our", "plus", "role", "should", "strong", "such", "team", "that", "the",
    "their", "this", "to", "using", "we", "what", "who", "will", "with", "work", "working",
    "years", "you", "your",
];

pub struct KeywordBackend;

#[async_trait]
impl ScoringBackend for KeywordBackend {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        let jd = section(prompt, "JD").ok_or(LlmError::InvalidPrompt("<JD>"))?;
        let resume = section(prompt, "RESUME").ok_or(LlmError::InvalidPrompt("<RESUME>"))?;
        let report = score_coverage(jd, resume);

        let mut top_reasons: Vec<String> = report
            .covered
            .iter()
            .take(3)
            .map(|k| format!("Resume mentions '{k}'"))
            .collect();
        top_reasons.extend(report.missing.iter().take(2).map(|k| format!("No mention of '{k}'")));

        let answer = json!({
            "candidate_name": guess_candidate_name(resume),
            "final_score": report.score,
            "hard_filter_pass": report.score >= PASS_THRESHOLD,
            "explanation": build_explanation(&report),
            "top_reasons": top_reasons,
            "risks": report
                .missing
                .iter()
                .take(3)
                .map(|k| format!("No evidence of {k}"))
                .collect::<Vec<_>>(),
        });
        Ok(answer.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CoverageReport {
    score: u32, // 0 – 100
    /// Highest-frequency first.
    covered: Vec<String>,
    missing: Vec<String>,
}

/// Text between the first `<TAG>` and the last `</TAG>` after it. The prompt builder
/// rewrites tags inside user text, so each tag appears once.
fn section<'a>(prompt: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = prompt.find(&open)? + open.len();
    let end = start + prompt[start..].rfind(&close)?;
    Some(prompt[start..end].trim())
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .map(|t| t.trim_matches('+').to_lowercase())
        .filter(|t| t.chars().count() >= 2 || t == "c" || t == "r")
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

/// JD keywords with their frequencies, most frequent first, ties alphabetical.
fn keyword_inventory(jd: &str) -> Vec<(String, u32)> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for token in tokens(jd) {
        *counts.entry(token).or_default() += 1;
    }
    let mut inventory: Vec<(String, u32)> = counts.into_iter().collect();
    // BTreeMap order is alphabetical; a stable sort keeps it for equal counts.
    inventory.sort_by(|a, b| b.1.cmp(&a.1));
    inventory.truncate(MAX_KEYWORDS);
    inventory
}

fn score_coverage(jd: &str, resume: &str) -> CoverageReport {
    let inventory = keyword_inventory(jd);
    if inventory.is_empty() {
        return CoverageReport {
            score: 0,
            covered: vec![],
            missing: vec![],
        };
    }

    let resume_tokens: HashSet<String> = tokens(resume).collect();
    let mut covered = Vec::new();
    let mut missing = Vec::new();
    let mut total = 0u32;
    let mut hit = 0u32;

    for (keyword, frequency) in inventory {
        total += frequency;
        if resume_tokens.contains(&keyword) {
            hit += frequency;
            covered.push(keyword);
        } else {
            missing.push(keyword);
        }
    }

    let score = ((hit as f64 / total as f64) * 100.0).round() as u32;
    CoverageReport {
        score: score.min(100),
        covered,
        missing,
    }
}

/// A first line of two to four capitalised words looks like a name.
fn guess_candidate_name(resume: &str) -> Option<String> {
    let first_line = resume.lines().map(str::trim).find(|l| !l.is_empty())?;
    let words: Vec<&str> = first_line.split_whitespace().collect();
    let looks_like_name = (2..=4).contains(&words.len())
        && words.iter().all(|w| {
            let mut chars = w.chars();
            chars.next().is_some_and(|c| c.is_uppercase())
                && chars.all(|c| c.is_alphabetic() || c == '-' || c == '\'' || c == '.')
        });
    looks_like_name.then(|| first_line.to_string())
}

fn build_explanation(report: &CoverageReport) -> String {
    if report.covered.is_empty() && report.missing.is_empty() {
        return "No keywords found in the job description; coverage could not be measured."
            .to_string();
    }
    let top_gaps: Vec<&str> = report.missing.iter().take(3).map(String::as_str).collect();
    let covered = report.covered.len();
    let total = covered + report.missing.len();

    if report.score >= 80 {
        format!(
            "Strong keyword fit ({}/100): the resume covers {covered} of {total} job description keywords.",
            report.score
        )
    } else if report.score >= PASS_THRESHOLD {
        format!(
            "Moderate keyword fit ({}/100): {covered} of {total} keywords covered. Not found: {}.",
            report.score,
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low keyword fit ({}/100): only {covered} of {total} keywords covered. Significant gaps: {}.",
            report.score,
            top_gaps.join(", ")
        )
    }
}
