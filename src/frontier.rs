use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};
use url::Url;

/// Case-study detail pages score highest, listing pages next, service pages
/// after that.
pub const CASE_STUDY_DETAIL_SEGMENT: &str = "/insights/case-study/";
pub const LISTING_SEGMENT: &str = "/insights";
const SERVICE_SEGMENT: &str = "service";

/// Flat-bonus keywords, additive on top of the tier score.
const PRIORITY_KEYWORDS: &[&str] = &[
    "work", "case", "project", "portfolio", "client", "about", "service",
    "solution", "story", "testimonial", "insights", "blog", "case-study",
];

const EXCLUDED_PATTERNS: &[&str] = &["login", "signup", "cart", "checkout", "admin"];

/// High-value listing paths visited ahead of the base URL regardless of score.
pub const SEED_PATHS: &[&str] = &["work", "insights", "insights?category=Case+Study"];

const MAX_URL_CHARS: usize = 2000;
const MAX_LINKS_PER_PAGE: usize = 10;

const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".exe", ".dmg",
    ".mp4", ".mp3", ".avi", ".mov", ".doc", ".docx", ".xls", ".xlsx",
];

/// Priority score for a URL; higher is more valuable, non-positive is never
/// enqueued. Only the first matching tier applies; keyword bonuses stack on
/// top; exclusions can push the total negative.
pub fn score_url(url: &str) -> i32 {
    let url_lower = url.to_lowercase();
    let mut score = 0;

    if url_lower.contains(CASE_STUDY_DETAIL_SEGMENT) {
        score += 100;
    } else if url_lower.contains(LISTING_SEGMENT) {
        score += 50;
    } else if url_lower.contains(SERVICE_SEGMENT) {
        score += 20;
    }

    for keyword in PRIORITY_KEYWORDS {
        if url_lower.contains(keyword) {
            score += 10;
        }
    }

    if EXCLUDED_PATTERNS.iter().any(|p| url_lower.contains(p)) {
        score -= 50;
    }

    score
}

/// A crawlable URL has a scheme and host, a bounded length, and no
/// binary/document extension.
pub fn is_valid_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if parsed.host_str().is_none() || parsed.scheme().is_empty() {
        return false;
    }
    if url.chars().count() > MAX_URL_CHARS {
        let prefix: String = url.chars().take(100).collect();
        warn!("Skipping excessively long URL: {prefix}...");
        return false;
    }
    let url_lower = url.to_lowercase();
    !BINARY_EXTENSIONS.iter().any(|ext| url_lower.ends_with(ext))
}

/// Dedup key: fragment always stripped; query stripped except on listing
/// paths, where it encodes distinct filtered views.
pub fn normalize_for_dedup(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    if without_fragment.to_lowercase().contains(LISTING_SEGMENT) {
        without_fragment.to_string()
    } else {
        without_fragment.split('?').next().unwrap_or(without_fragment).to_string()
    }
}

/// Breadth-first work queue of (url, depth) pairs with a visited set.
/// Owned exclusively by the crawl loop.
pub struct Frontier {
    base: Url,
    queue: VecDeque<(String, u32)>,
    visited: HashSet<String>,
    max_pages: usize,
    max_depth: u32,
}

impl Frontier {
    /// Seeds are front-loaded ahead of the base URL so the high-value
    /// listing pages are always visited first.
    pub fn new(base: Url, max_pages: usize, max_depth: u32) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((base.to_string(), 0));
        for seed_path in SEED_PATHS.iter().rev() {
            if let Ok(seed) = base.join(seed_path) {
                queue.push_front((seed.to_string(), 0));
            }
        }
        Self {
            base,
            queue,
            visited: HashSet::new(),
            max_pages,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// Next unvisited item within the depth budget, or `None` when the
    /// frontier is empty or the page budget is spent.
    pub fn pop(&mut self) -> Option<(String, u32)> {
        while let Some((url, depth)) = self.queue.pop_front() {
            if self.budget_exhausted() {
                return None;
            }
            if depth > self.max_depth || self.visited.contains(&url) {
                continue;
            }
            return Some((url, depth));
        }
        None
    }

    pub fn mark_visited(&mut self, url: &str) {
        self.visited.insert(url.to_string());
    }

    /// Score, sort, and enqueue a page's outbound hrefs at `next_depth`.
    /// Internal links only; per page, only the top 10 positively scored
    /// survive. Returns how many were queued.
    pub fn discover(&mut self, current_url: &str, hrefs: &[String], next_depth: u32) -> usize {
        let Ok(current) = Url::parse(current_url) else {
            return 0;
        };

        let mut scored: Vec<(i32, String)> = Vec::new();
        for href in hrefs {
            let href = href.trim();
            if href.is_empty()
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with('#')
            {
                continue;
            }

            let Ok(full) = current.join(href) else {
                continue;
            };
            let full = full.to_string();
            if !is_valid_url(&full) {
                continue;
            }
            if Url::parse(&full).ok().and_then(|u| u.host_str().map(String::from))
                != self.base.host_str().map(String::from)
            {
                continue;
            }

            let clean = normalize_for_dedup(&full);
            if self.visited.contains(&clean) {
                continue;
            }
            scored.push((score_url(&clean), clean));
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut added = 0;
        for (score, url) in scored.into_iter().take(MAX_LINKS_PER_PAGE) {
            if score > 0 {
                debug!("Queued (priority {score}): {url}");
                self.queue.push_back((url, next_depth));
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_page_outscores_login() {
        let detail = score_url("https://site.com/insights/case-study/acme");
        // 100 tier + "case" + "insights" + "case-study" keyword bonuses
        assert_eq!(detail, 130);
        assert!(score_url("https://site.com/login") < 0);
        assert!(detail > score_url("https://site.com/login"));
    }

    #[test]
    fn tiers_are_exclusive_but_keywords_stack() {
        // Listing tier (50) + "insights" keyword (10)
        assert_eq!(score_url("https://site.com/insights"), 60);
        // Service tier (20) + "service" + "solution" keywords
        assert_eq!(score_url("https://site.com/services/solutions"), 40);
    }

    #[test]
    fn url_validity_rules() {
        assert!(is_valid_url("https://site.com/work"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("https://site.com/brochure.pdf"));
        assert!(!is_valid_url("https://site.com/photo.JPG"));
        let long = format!("https://site.com/{}", "a".repeat(2100));
        assert!(!is_valid_url(&long));
    }

    #[test]
    fn dedup_key_strips_fragment_and_query() {
        assert_eq!(
            normalize_for_dedup("https://site.com/about?utm=x#team"),
            "https://site.com/about"
        );
        // Listing pages keep query strings: they encode distinct views
        assert_eq!(
            normalize_for_dedup("https://site.com/insights?category=Case+Study#top"),
            "https://site.com/insights?category=Case+Study"
        );
    }

    #[test]
    fn seeds_dequeue_before_base_url() {
        let base = Url::parse("https://site.com/").unwrap();
        let mut frontier = Frontier::new(base, 30, 3);
        let (first, _) = frontier.pop().unwrap();
        assert_eq!(first, "https://site.com/work");
        frontier.mark_visited(&first);
        let (second, _) = frontier.pop().unwrap();
        assert_eq!(second, "https://site.com/insights");
    }

    #[test]
    fn discover_keeps_top_positive_links_only() {
        let base = Url::parse("https://site.com/").unwrap();
        let mut frontier = Frontier::new(base, 30, 3);
        while frontier.pop().is_some() {} // drain seeds

        let hrefs: Vec<String> = vec![
            "/insights/case-study/acme".into(),
            "/login".into(),
            "/pricing".into(),
            "https://elsewhere.com/work".into(),
            "mailto:hi@site.com".into(),
        ];
        let added = frontier.discover("https://site.com/", &hrefs, 1);
        assert_eq!(added, 1);
        let (url, depth) = frontier.pop().unwrap();
        assert_eq!(url, "https://site.com/insights/case-study/acme");
        assert_eq!(depth, 1);
    }

    #[test]
    fn visited_urls_never_requeued() {
        let base = Url::parse("https://site.com/").unwrap();
        let mut frontier = Frontier::new(base, 30, 3);
        frontier.mark_visited("https://site.com/work");
        let added = frontier.discover("https://site.com/", &["/work".to_string()], 1);
        assert_eq!(added, 0);
    }

    #[test]
    fn page_budget_halts_pop() {
        let base = Url::parse("https://site.com/").unwrap();
        let mut frontier = Frontier::new(base, 1, 3);
        let (first, _) = frontier.pop().unwrap();
        frontier.mark_visited(&first);
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn depth_budget_skips_deep_items() {
        let base = Url::parse("https://site.com/").unwrap();
        let mut frontier = Frontier::new(base, 30, 1);
        while frontier.pop().is_some() {} // drain depth-0 seeds
        frontier.discover("https://site.com/", &["/work/case-study/x".to_string()], 2);
        assert!(frontier.pop().is_none());
    }
}
