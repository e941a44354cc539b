use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{element_classes, element_text, first_text, patterns, taxonomy};
use crate::frontier::{CASE_STUDY_DETAIL_SEGMENT, LISTING_SEGMENT};
use crate::kb::{timestamp_now, CaseStudy, NOT_SPECIFIED};

pub const PROBLEM_SENTINEL: &str = "Problem description not found";
pub const SOLUTION_SENTINEL: &str = "Solution description not found";
pub const RESULTS_SENTINEL: &str = "Results not specified";

/// Class tokens marking a block as case-study-relevant.
const RELEVANT_CLASS_KEYWORDS: &[&str] = &[
    "case", "project", "portfolio", "client", "story", "testimonial", "work", "study",
];

/// Generic card-layout class tokens.
const CARD_CLASS_KEYWORDS: &[&str] = &["card", "item", "box", "tile", "panel", "block"];

const MIN_BLOCK_CHARS: usize = 100;
const MIN_ARTICLE_CHARS: usize = 200;
const MAX_TECHNOLOGIES: usize = 10;

static CLASSED_CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article[class], section[class], div[class]").unwrap());
static CLASSED_ANY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class]").unwrap());
static ARTICLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article, main").unwrap());
static BLOCK_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4").unwrap());
static CARD_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

/// A candidate DOM region. Discarded after producing at most one draft.
struct ContentBlock<'a> {
    element: ElementRef<'a>,
    title: Option<String>,
    text: String,
}

/// Run the full strategy ensemble over a parsed page and emit draft case
/// studies. Strategies are unioned, not mutually exclusive; the quality
/// filter downstream arbitrates overlapping drafts.
pub fn extract_case_studies(document: &Html, url: &str, next_id: &mut i64) -> Vec<CaseStudy> {
    let mut blocks = semantic_blocks(document);
    blocks.extend(card_blocks(document));
    blocks.extend(article_blocks(document, url));

    let mut drafts = Vec::new();

    for block in blocks {
        if block.text.chars().count() < MIN_BLOCK_CHARS {
            continue;
        }

        let problem = patterns::extract_problem(&block.text);
        let solution = patterns::extract_solution(&block.text);
        let results = patterns::extract_results(&block.text);
        let technologies = taxonomy::detect_technologies(&block.text);
        let industries = taxonomy::detect_industries(&block.text);

        if problem.is_none() && solution.is_none() && results.is_none() && technologies.len() <= 2 {
            continue;
        }

        let problem_text = problem.unwrap_or_else(|| PROBLEM_SENTINEL.to_string());
        let solution_text = solution.unwrap_or_else(|| SOLUTION_SENTINEL.to_string());

        // A block that merely mentions a keyword in passing produces short
        // spans and few technologies; don't emit a draft for it.
        if problem_text.chars().count() < 100
            && solution_text.chars().count() < 100
            && technologies.len() < 3
        {
            warn!("Skipping case study candidate on {url}: content too short");
            continue;
        }

        let title = first_text(&block.element, &BLOCK_HEADING_SEL)
            .or_else(|| block.title.clone())
            .unwrap_or_default();
        let client_name = client_name_from_title(&title);

        let confidence = if technologies.len() > 2 { "high" } else { "medium" };
        let mut technologies = technologies;
        technologies.truncate(MAX_TECHNOLOGIES);

        let draft = CaseStudy {
            id: *next_id,
            client_name: client_name.clone(),
            industry: industries
                .first()
                .cloned()
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            problem: problem_text,
            solution: solution_text,
            technologies,
            results: results.unwrap_or_else(|| RESULTS_SENTINEL.to_string()),
            duration: NOT_SPECIFIED.to_string(),
            url: url.to_string(),
            extracted_at: timestamp_now(),
            metadata: [("confidence".to_string(), confidence.to_string())]
                .into_iter()
                .collect(),
        };
        debug!("Created case study #{} on {url}: {client_name}", draft.id);
        *next_id += 1;
        drafts.push(draft);
    }

    drafts
}

/// Nearest heading, split on a dash separator; the first segment is the
/// client name.
fn client_name_from_title(title: &str) -> String {
    let title = title.trim();
    if let Some((name, _)) = title.split_once('-') {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if title.is_empty() {
        "Unnamed Project".to_string()
    } else {
        title.to_string()
    }
}

/// Semantic-tag strategy: article/section/div whose class tokens include a
/// relevance keyword and whose visible text clears the length threshold.
fn semantic_blocks(document: &Html) -> Vec<ContentBlock<'_>> {
    let mut blocks = Vec::new();
    for element in document.select(&CLASSED_CONTAINER_SEL) {
        let classes = element_classes(&element);
        if !RELEVANT_CLASS_KEYWORDS.iter().any(|kw| classes.contains(kw)) {
            continue;
        }
        let text = element_text(&element);
        if text.chars().count() > MIN_BLOCK_CHARS {
            debug!("Semantic content block: {}.{}", element.value().name(), classes);
            blocks.push(ContentBlock {
                element,
                title: None,
                text,
            });
        }
    }
    blocks
}

/// Card-layout strategy: generic card/item/box/tile/panel/block classes,
/// kept when a heading exists or the text clears the threshold.
fn card_blocks(document: &Html) -> Vec<ContentBlock<'_>> {
    let mut blocks = Vec::new();
    for keyword in CARD_CLASS_KEYWORDS {
        for element in document.select(&CLASSED_ANY_SEL) {
            if !element_classes(&element).contains(keyword) {
                continue;
            }
            let title = first_text(&element, &CARD_HEADING_SEL);
            let text = element_text(&element);
            if title.is_some() || text.chars().count() > MIN_BLOCK_CHARS {
                blocks.push(ContentBlock {
                    element,
                    title,
                    text,
                });
            }
        }
    }
    blocks
}

/// Article-body strategy, only for URLs resembling detail/insights pages.
fn article_blocks<'a>(document: &'a Html, url: &str) -> Vec<ContentBlock<'a>> {
    let url_lower = url.to_lowercase();
    if !url_lower.contains(CASE_STUDY_DETAIL_SEGMENT) && !url_lower.contains(LISTING_SEGMENT) {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    for element in document.select(&ARTICLE_SEL) {
        let text = element_text(&element);
        if text.chars().count() > MIN_ARTICLE_CHARS {
            debug!("Article block with {} chars", text.len());
            blocks.push(ContentBlock {
                element,
                title: None,
                text,
            });
        }
    }
    blocks
}
