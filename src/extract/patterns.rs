use std::sync::LazyLock;

use regex::Regex;

/// Matches at or below this length are noise (a bare trigger word plus a few
/// characters of context) and are discarded.
const MIN_MATCH_CHARS: usize = 30;

const LINE_WINDOW: usize = 10;
const LINE_WINDOW_TARGET_CHARS: usize = 300;
const SECTION_CAP_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Problem,
    Solution,
    Result,
}

const PROBLEM_PATTERNS: &[&str] = &[
    r"(?i)(challenge|problem|issue|struggle|difficulty|pain point|needed to|required to)[\w\s:,-]{20,200}",
    r"(?i)(facing|faced with|dealing with|suffering from)[\w\s:,-]{20,200}",
    r"(?i)(couldn't|wasn't able to|failed to|lacked)[\w\s:,-]{20,200}",
];

const SOLUTION_PATTERNS: &[&str] = &[
    r"(?i)(implemented|developed|built|created|designed|deployed|solution|approach)[\w\s:,-]{20,200}",
    r"(?i)(we developed|we built|we created|we implemented|we designed)[\w\s:,-]{20,200}",
    r"(?i)(using|leveraging|utilizing|by building|by creating)[\w\s:,-]{20,200}",
];

const RESULT_PATTERNS: &[&str] = &[
    r"(?i)(increased by|improved by|reduced by|decreased by|achieved|grew by)\s+\d+%",
    r"(?i)(\d+%\s+(increase|improvement|reduction|growth|decrease))",
    r"(?i)(result|outcome|impact|achievement|success)[\w\s:,-]{20,200}",
    r"(?i)(saved|generated|earned|revenue|profit)\s+[$€£¥]\d+",
];

/// Line-window trigger vocabularies, used on rendered article text where the
/// regex context windows are unreliable.
pub const PROBLEM_SECTION_KEYWORDS: &[&str] = &[
    "challenge", "problem", "issue", "pain point", "struggle",
    "difficulty", "before", "situation",
];

pub const SOLUTION_SECTION_KEYWORDS: &[&str] = &[
    "solution", "approach", "implemented", "built", "developed",
    "created", "how we", "what we did",
];

pub const RESULT_SECTION_KEYWORDS: &[&str] = &[
    "result", "outcome", "impact", "achievement", "success",
    "improvement", "growth", "increase", "reduction",
];

static FIELD_MATCHERS: LazyLock<Vec<(FieldKind, Regex)>> = LazyLock::new(|| {
    let compile = |kind, patterns: &[&str]| {
        patterns
            .iter()
            .map(|p| (kind, Regex::new(p).unwrap()))
            .collect::<Vec<_>>()
    };
    let mut table = compile(FieldKind::Problem, PROBLEM_PATTERNS);
    table.extend(compile(FieldKind::Solution, SOLUTION_PATTERNS));
    table.extend(compile(FieldKind::Result, RESULT_PATTERNS));
    table
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PERCENT_METRIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+%\s+(?:increase|improvement|growth|reduction|decrease)").unwrap()
});
static MULTIPLIER_METRIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+x\s+(?:growth|increase|faster)").unwrap());
static CURRENCY_METRIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£]\d+(?:K|M|B)?").unwrap());

/// Regex-scan strategy: first sufficiently long match for the field, in
/// pattern order then text order. `None` when nothing useful matched.
pub fn extract_field(kind: FieldKind, text: &str) -> Option<String> {
    FIELD_MATCHERS
        .iter()
        .filter(|(k, _)| *k == kind)
        .flat_map(|(_, re)| re.find_iter(text))
        .map(|m| m.as_str().trim().to_string())
        .find(|m| m.chars().count() > MIN_MATCH_CHARS)
}

pub fn extract_problem(text: &str) -> Option<String> {
    extract_field(FieldKind::Problem, text)
}

pub fn extract_solution(text: &str) -> Option<String> {
    extract_field(FieldKind::Solution, text)
}

pub fn extract_results(text: &str) -> Option<String> {
    extract_field(FieldKind::Result, text)
}

/// Line-window strategy: on the first line containing any keyword, gather up
/// to the next 10 substantial lines (stopping past ~300 accumulated chars),
/// collapse whitespace, cap at 500 chars. An empty window keeps scanning.
pub fn extract_section(content: &str, keywords: &[&str]) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let line_lower = line.to_lowercase();
        if !keywords.iter().any(|kw| line_lower.contains(kw)) {
            continue;
        }

        let end = (i + LINE_WINDOW).min(lines.len());
        let mut parts: Vec<&str> = Vec::new();
        let mut accumulated = 0;
        for candidate in &lines[i..end] {
            let trimmed = candidate.trim();
            if !trimmed.is_empty() && trimmed.chars().count() > 20 {
                accumulated += trimmed.len() + 1;
                parts.push(trimmed);
            }
            if accumulated > LINE_WINDOW_TARGET_CHARS {
                break;
            }
        }

        if !parts.is_empty() {
            let section = WHITESPACE_RE.replace_all(&parts.join(" "), " ").to_string();
            return Some(section.chars().take(SECTION_CAP_CHARS).collect());
        }
    }

    None
}

/// Numeric result supplement: percentage deltas, multiplier growth, and
/// currency figures, comma-joined. Bounded per category.
pub fn extract_metrics(content: &str) -> Option<String> {
    let mut metrics: Vec<String> = Vec::new();

    metrics.extend(
        PERCENT_METRIC_RE
            .find_iter(content)
            .take(3)
            .map(|m| m.as_str().to_string()),
    );
    metrics.extend(
        MULTIPLIER_METRIC_RE
            .find_iter(content)
            .take(2)
            .map(|m| m.as_str().to_string()),
    );
    metrics.extend(
        CURRENCY_METRIC_RE
            .find_iter(content)
            .take(2)
            .map(|m| m.as_str().to_string()),
    );

    if metrics.is_empty() {
        None
    } else {
        Some(metrics.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_returns_none() {
        assert_eq!(extract_problem("nothing relevant here"), None);
        assert_eq!(extract_solution("nothing relevant here"), None);
        assert_eq!(extract_results("nothing relevant here"), None);
    }

    #[test]
    fn short_matches_are_discarded() {
        // Trigger word with too little trailing context
        let text = "The challenge was real and the going got tough quickly here";
        if let Some(m) = extract_problem(text) {
            assert!(m.chars().count() > 30, "kept a short span: {m:?}");
        }
    }

    #[test]
    fn problem_extraction_finds_trigger_context() {
        let text = "The client was facing severe performance degradation during \
                    seasonal traffic spikes across all regions";
        let problem = extract_problem(text).unwrap();
        assert!(problem.starts_with("facing"));
        assert!(problem.chars().count() > 30);
    }

    #[test]
    fn solution_extraction_prefers_first_pattern_hit() {
        let text = "We implemented a queue-based ingestion layer to decouple \
                    producers from the reporting database";
        let solution = extract_solution(text).unwrap();
        assert!(solution.starts_with("implemented"));
    }

    #[test]
    fn results_capture_textual_outcome() {
        let text = "The outcome was a dramatic reduction in page load times \
                    across every storefront";
        let results = extract_results(text).unwrap();
        assert!(results.starts_with("outcome"));
    }

    #[test]
    fn line_window_accumulates_following_lines() {
        let content = "Intro line\n\
                       The challenge facing the team was substantial indeed\n\
                       Legacy batch jobs were overrunning their nightly window\n\
                       short\n\
                       Reports arrived hours late and finance lost confidence\n";
        let section = extract_section(content, PROBLEM_SECTION_KEYWORDS).unwrap();
        assert!(section.contains("Legacy batch jobs"));
        assert!(section.contains("finance lost confidence"));
        assert!(!section.contains("short"));
        assert!(section.len() <= 500);
    }

    #[test]
    fn line_window_skips_keyword_line_with_empty_window() {
        // Keyword line too short to qualify, followed by nothing substantial
        // within the window, then a later qualifying section.
        let content = "problem\n\nx\n\ny\n\nz\n\na\n\nb\n\nc\n\
                       The problem showed up in production dashboards every single morning\n";
        let section = extract_section(content, PROBLEM_SECTION_KEYWORDS).unwrap();
        assert!(section.contains("production dashboards"));
    }

    #[test]
    fn line_window_none_when_no_keyword() {
        assert_eq!(extract_section("plain text\nmore text", RESULT_SECTION_KEYWORDS), None);
    }

    #[test]
    fn metrics_collects_bounded_matches() {
        let content = "We saw 40% increase in signups, 12% reduction in churn, \
                       3x growth in traffic, and $2M additional revenue.";
        let metrics = extract_metrics(content).unwrap();
        assert!(metrics.contains("40% increase"));
        assert!(metrics.contains("3x growth"));
        assert!(metrics.contains("$2M"));
    }

    #[test]
    fn metrics_none_when_absent() {
        assert_eq!(extract_metrics("no numbers to speak of"), None);
    }
}
