use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use super::{element_text, patterns, taxonomy};
use crate::fetch::Fetcher;
use crate::frontier::SEED_PATHS;
use crate::kb::{timestamp_now, CaseStudy, NOT_SPECIFIED};

/// Article-pipeline ids continue past the curated manual range.
pub const ARTICLE_ID_START: i64 = 11;

const MAX_TECHNOLOGIES: usize = 15;
const DEFAULT_INDUSTRY: &str = "Technology";
const REQUEST_PAUSE_SECS: u64 = 2;
const MIN_BODY_CHARS: usize = 200;
const PREFERRED_BODY_CHARS: usize = 500;

/// Class-based body selectors tried after the semantic tags.
const CONTENT_SELECTORS: &[&str] =
    &[".post-content", ".article-content", ".content", ".entry-content"];

static H1_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static OG_TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static META_DESC_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static ARTICLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").unwrap());
static MAIN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("main").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

static POSSESSIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-zA-Z]+(?:[.\s]+[A-Z][a-zA-Z]+)*)'s").unwrap());
static HELPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"How\s+[A-Z][a-zA-Z]+\s+(?:Helped|Took|Delivered|Scaled)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)")
        .unwrap()
});
static HOW_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"How\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)\s+(?:Reduced|Cut|Achieved|Transformed|Scaled)")
        .unwrap()
});
static FOR_WITH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:for|with|behind)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)").unwrap()
});

const HELPED_STOPWORDS: &[&str] = &["Ideas", "Idea", "A", "The", "From"];
const FOR_WITH_STOPWORDS: &[&str] =
    &["The", "This", "That", "Record", "Breaking", "Just", "Higher"];

/// Scrape detail-page URLs one at a time, pausing between requests.
pub async fn scrape_articles(fetcher: &Fetcher, urls: &[String]) -> Vec<CaseStudy> {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut case_studies = Vec::new();
    let mut next_id = ARTICLE_ID_START;

    for url in urls {
        match fetcher.fetch_page(url).await {
            Some(html) => match extract_article(&html, url, &mut next_id) {
                Some(cs) => {
                    info!("Extracted article case study: {}", cs.client_name);
                    case_studies.push(cs);
                }
                None => warn!("No article content found on {url}"),
            },
            None => warn!("Skipping {url}: fetch failed"),
        }
        tokio::time::sleep(std::time::Duration::from_secs(REQUEST_PAUSE_SECS)).await;
        pb.inc(1);
    }

    pb.finish_and_clear();
    case_studies
}

/// Harvest case-study detail links from the listing seed pages.
pub async fn discover_case_study_urls(fetcher: &Fetcher, base: &Url) -> Vec<String> {
    let mut discovered = BTreeSet::new();

    for seed_path in SEED_PATHS {
        let Ok(seed) = base.join(seed_path) else {
            continue;
        };
        info!("Discovering case studies from: {seed}");
        if let Some(html) = fetcher.fetch_page(seed.as_str()).await {
            discovered.extend(case_study_links(&html, base));
        }
        tokio::time::sleep(std::time::Duration::from_secs(REQUEST_PAUSE_SECS)).await;
    }

    info!("Discovery complete: {} case study URLs", discovered.len());
    discovered.into_iter().collect()
}

/// All anchors pointing at a case-study detail path, absolutized.
fn case_study_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    for anchor in document.select(&ANCHOR_SEL) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().contains("case-study") {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let resolved = resolved.to_string();
        if resolved.contains("/insights/case-study/") || resolved.contains("/work/case-study/") {
            links.insert(resolved);
        }
    }

    links.into_iter().collect()
}

/// Extract one case study from a rendered detail page, or `None` when no
/// usable body text is present.
pub fn extract_article(html: &str, url: &str, next_id: &mut i64) -> Option<CaseStudy> {
    let document = Html::parse_document(html);

    let title = document
        .select(&H1_SEL)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&TITLE_SEL)
                .next()
                .map(|el| element_text(&el))
                .filter(|t| !t.is_empty())
        })
        .or_else(|| {
            document
                .select(&OG_TITLE_SEL)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(str::to_string)
        });

    let description = document
        .select(&META_DESC_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string);

    let body = article_body(&document, description.as_deref())?;

    Some(build_case_study(
        title.as_deref(),
        &body,
        url,
        description.as_deref(),
        next_id,
    ))
}

/// Line-preserving text, one text node per line. The line-window strategy
/// needs rendered-text structure, not a space-joined blob.
fn element_lines(element: &scraper::ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body fallback chain: article, then main, then common content-class
/// selectors, then the meta description.
fn article_body(document: &Html, description: Option<&str>) -> Option<String> {
    let mut body = document
        .select(&ARTICLE_SEL)
        .next()
        .map(|el| element_lines(&el))
        .unwrap_or_default();

    if body.chars().count() < PREFERRED_BODY_CHARS {
        if let Some(main) = document.select(&MAIN_SEL).next() {
            let main_text = element_lines(&main);
            if main_text.len() > body.len() {
                body = main_text;
            }
        }
    }

    if body.chars().count() < PREFERRED_BODY_CHARS {
        for selector_str in CONTENT_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(el) = document.select(&selector).next() {
                let text = element_lines(&el);
                if text.len() > body.len() {
                    body = text;
                    break;
                }
            }
        }
    }

    if body.chars().count() < MIN_BODY_CHARS {
        if let Some(desc) = description {
            if !desc.is_empty() {
                warn!("Using meta description as body fallback");
                body = desc.to_string();
            }
        }
    }

    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn build_case_study(
    title: Option<&str>,
    content: &str,
    url: &str,
    description: Option<&str>,
    next_id: &mut i64,
) -> CaseStudy {
    let client_name = extract_client_name(title, url);

    let industry = taxonomy::detect_industries(content)
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_INDUSTRY.to_string());

    let mut technologies = taxonomy::detect_technologies(content);
    technologies.truncate(MAX_TECHNOLOGIES);

    let problem = patterns::extract_section(content, patterns::PROBLEM_SECTION_KEYWORDS)
        .or_else(|| description.map(str::to_string).filter(|d| !d.is_empty()))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let solution = patterns::extract_section(content, patterns::SOLUTION_SECTION_KEYWORDS)
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    let mut results = patterns::extract_section(content, patterns::RESULT_SECTION_KEYWORDS);
    if let Some(metrics) = patterns::extract_metrics(content) {
        results = match results {
            Some(r) if !r.contains(NOT_SPECIFIED) => Some(format!("{r} {metrics}")),
            _ => Some(metrics),
        };
    }

    let confidence = if technologies.len() > 3 { "high" } else { "medium" };

    let case_study = CaseStudy {
        id: *next_id,
        client_name,
        industry,
        problem,
        solution,
        technologies,
        results: results.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        duration: NOT_SPECIFIED.to_string(),
        url: url.to_string(),
        extracted_at: timestamp_now(),
        metadata: [
            ("confidence".to_string(), confidence.to_string()),
            ("source".to_string(), "article_scraper".to_string()),
        ]
        .into_iter()
        .collect(),
    };
    *next_id += 1;
    case_study
}

/// Client name from the article title, falling back to the URL slug.
fn extract_client_name(title: Option<&str>, url: &str) -> String {
    let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
        return "Unknown Client".to_string();
    };

    // Possessive: "Scaling Acme's Payment Platform"
    if let Some(caps) = POSSESSIVE_RE.captures(title) {
        return caps[1].to_string();
    }

    // "How <Agency> Helped <Client> ..."
    if let Some(caps) = HELPED_RE.captures(title) {
        let name = &caps[1];
        if !HELPED_STOPWORDS.contains(&name) {
            return name.to_string();
        }
    }

    // "How <Client> Reduced ..."
    if let Some(caps) = HOW_VERB_RE.captures(title) {
        return caps[1].to_string();
    }

    // "... for/with/behind <Client>"
    if let Some(caps) = FOR_WITH_RE.captures(title) {
        let name = &caps[1];
        if !FOR_WITH_STOPWORDS.contains(&name) {
            return name.to_string();
        }
    }

    // URL slug: first capitalized segment
    if let Some(slug) = url.rsplit('/').next() {
        for part in slug.split('-') {
            if part.chars().count() > 2 && part.chars().next().is_some_and(char::is_uppercase) {
                let mut chars = part.chars();
                let first = chars.next().unwrap();
                return format!("{}{}", first, chars.as_str().to_lowercase());
            }
        }
    }

    title.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

/// URLs from a plain text file, one per line, `#` for comments.
pub fn load_urls_from_file(path: &std::path::Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("File not found: {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_name_from_possessive() {
        assert_eq!(
            extract_client_name(Some("The engineering behind Acme's storefront"), ""),
            "Acme"
        );
    }

    #[test]
    fn client_name_from_helped_pattern() {
        assert_eq!(
            extract_client_name(Some("How Studio Helped Northwind scale checkout"), ""),
            "Northwind"
        );
    }

    #[test]
    fn client_name_from_how_verb_pattern() {
        assert_eq!(
            extract_client_name(Some("How Lakeside Reduced Support Load"), ""),
            "Lakeside"
        );
    }

    #[test]
    fn client_name_missing_title() {
        assert_eq!(extract_client_name(None, "https://x.com/a"), "Unknown Client");
    }

    #[test]
    fn article_fixture_extracts_case_study() {
        let html = std::fs::read_to_string("tests/fixtures/article.html").unwrap();
        let mut next_id = ARTICLE_ID_START;
        let cs = extract_article(
            &html,
            "https://example.com/insights/case-study/meditrack",
            &mut next_id,
        )
        .unwrap();
        assert_eq!(cs.id, ARTICLE_ID_START);
        assert_eq!(next_id, ARTICLE_ID_START + 1);
        assert_eq!(cs.client_name, "MediTrack");
        assert!(!cs.technologies.is_empty());
        assert_eq!(cs.metadata.get("source").unwrap(), "article_scraper");
        assert_ne!(cs.problem, NOT_SPECIFIED);
        assert_ne!(cs.solution, NOT_SPECIFIED);
    }

    #[test]
    fn metrics_supplement_results() {
        let html = std::fs::read_to_string("tests/fixtures/article.html").unwrap();
        let mut next_id = 1;
        let cs = extract_article(
            &html,
            "https://example.com/insights/case-study/meditrack",
            &mut next_id,
        )
        .unwrap();
        assert!(cs.results.contains('%'));
    }

    #[test]
    fn no_body_yields_none() {
        let html = "<html><head><title>Thin</title></head><body><p>x</p></body></html>";
        let mut next_id = 1;
        assert!(extract_article(html, "https://example.com/p", &mut next_id).is_none());
    }

    #[test]
    fn discovery_links_filtered_to_detail_paths() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<html><body>
            <a href="/insights/case-study/acme">Acme</a>
            <a href="/insights/case-study/acme">Acme again</a>
            <a href="/work/case-study/zenith">Zenith</a>
            <a href="/insights/some-case-study-roundup-page">Roundup</a>
            <a href="/about">About</a>
        </body></html>"#;
        let links = case_study_links(html, &base);
        assert_eq!(
            links,
            vec![
                "https://example.com/insights/case-study/acme".to_string(),
                "https://example.com/work/case-study/zenith".to_string(),
            ]
        );
    }

    #[test]
    fn url_file_skips_comments() {
        let dir = std::env::temp_dir().join("kb_scraper_url_list_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("urls.txt");
        std::fs::write(&path, "# comment\nhttps://a.com/x\n\nhttps://b.com/y\n").unwrap();
        let urls = load_urls_from_file(&path).unwrap();
        assert_eq!(urls, vec!["https://a.com/x", "https://b.com/y"]);
    }
}
