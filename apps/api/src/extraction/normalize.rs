//! Text clean-up shared by the PDF and DOCX paths.

use std::sync::OnceLock;

use regex::Regex;

/// Counts characters that carry content (everything except whitespace).
pub fn content_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Collapses every whitespace run (including newlines and NULs) into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.replace('\0', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rejoins words broken across lines with a trailing hyphen: `manage-\nment` → `management`.
pub fn fix_hyphenation(text: &str) -> String {
    static HYPHEN_BREAK: OnceLock<Regex> = OnceLock::new();
    let re = HYPHEN_BREAK.get_or_init(|| {
        Regex::new(r"([A-Za-z])-[ \t]*\r?\n[ \t]*([A-Za-z])").expect("static regex is valid")
    });
    re.replace_all(text, "$1$2").into_owned()
}

/// Removes a running header and/or footer: a first (or last) line that
/// appears on more than half of the non-empty pages is dropped wherever it occurs
/// in that position.
pub fn drop_repeating_headers(pages: Vec<String>) -> Vec<String> {
    let non_empty: Vec<&String> = pages.iter().filter(|p| !p.trim().is_empty()).collect();
    if non_empty.len() < 2 {
        return pages;
    }

    let firsts: Vec<&str> = non_empty.iter().filter_map(|p| first_line(p)).collect();
    let lasts: Vec<&str> = non_empty.iter().filter_map(|p| last_line(p)).collect();
    let head = dominant_line(&firsts, non_empty.len()).map(str::to_string);
    let tail = dominant_line(&lasts, non_empty.len()).map(str::to_string);

    if head.is_none() && tail.is_none() {
        return pages;
    }

    pages
        .into_iter()
        .map(|page| {
            let mut lines: Vec<&str> = page.lines().collect();
            if let Some(head) = &head {
                if let Some(idx) = lines.iter().position(|l| !l.trim().is_empty()) {
                    if lines[idx].trim() == head {
                        lines.remove(idx);
                    }
                }
            }
            if let Some(tail) = &tail {
                if let Some(idx) = lines.iter().rposition(|l| !l.trim().is_empty()) {
                    if lines[idx].trim() == tail {
                        lines.remove(idx);
                    }
                }
            }
            lines.join("\n")
        })
        .collect()
}

fn first_line(page: &str) -> Option<&str> {
    page.lines().map(str::trim).find(|l| !l.is_empty())
}

fn last_line(page: &str) -> Option<&str> {
    page.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

fn dominant_line<'a>(lines: &[&'a str], pages: usize) -> Option<&'a str> {
    let candidate = *lines.first()?;
    let count = lines.iter().filter(|l| **l == candidate).count();
    (count > pages / 2).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_chars_ignores_whitespace() {
        assert_eq!(content_chars(" a b\n\tc "), 3);
        assert_eq!(content_chars(""), 0);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Jane\t\tDoe \r\n Rust\0dev "), "Jane Doe Rust dev");
    }

    #[test]
    fn test_fix_hyphenation_joins_broken_words() {
        assert_eq!(fix_hyphenation("project manage-\nment"), "project management");
        assert_eq!(fix_hyphenation("manage-  \r\n  ment"), "management");
    }

    #[test]
    fn test_fix_hyphenation_keeps_real_hyphens() {
        assert_eq!(fix_hyphenation("full-stack engineer"), "full-stack engineer");
        assert_eq!(fix_hyphenation("2019-\n2021"), "2019-\n2021");
    }

    #[test]
    fn test_drop_repeating_headers_and_footers() {
        let pages = vec![
            "Jane Doe - Resume\nExperience at Acme\nPage footer".to_string(),
            "Jane Doe - Resume\nEducation at MIT\nPage footer".to_string(),
            "Jane Doe - Resume\nSkills: Rust\nPage footer".to_string(),
        ];
        let cleaned = drop_repeating_headers(pages);
        assert_eq!(cleaned[0], "Experience at Acme");
        assert_eq!(cleaned[1], "Education at MIT");
        assert_eq!(cleaned[2], "Skills: Rust");
    }

    #[test]
    fn test_single_page_is_untouched() {
        let pages = vec!["Header\nBody\nFooter".to_string()];
        assert_eq!(drop_repeating_headers(pages.clone()), pages);
    }

    #[test]
    fn test_no_majority_header_is_untouched() {
        let pages = vec![
            "Alpha\nbody one".to_string(),
            "Beta\nbody two".to_string(),
            "Gamma\nbody three".to_string(),
        ];
        assert_eq!(drop_repeating_headers(pages.clone()), pages);
    }
}
