use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::extract::{case_studies, element_text, services, taxonomy};
use crate::fetch::Fetcher;
use crate::frontier::Frontier;
use crate::kb::KnowledgeBase;

/// Fixed politeness delay honored after every fetch attempt.
const REQUEST_DELAY_SECS: u64 = 1;

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

pub struct CrawlOutcome {
    pub knowledge_base: KnowledgeBase,
    pub pages_visited: usize,
}

/// All crawl state in one owned struct: frontier, fetcher, and the
/// accumulating document. No ambient state; the loop owns everything.
pub struct Crawler {
    base: Url,
    fetcher: Fetcher,
    frontier: Frontier,
    knowledge_base: KnowledgeBase,
    next_case_study_id: i64,
    shutdown: Arc<AtomicBool>,
}

impl Crawler {
    pub fn new(base_url: &str, max_pages: usize, max_depth: u32) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {base_url}"))?;
        info!("Crawler initialized: base={base} max_pages={max_pages} max_depth={max_depth}");
        Ok(Self {
            frontier: Frontier::new(base.clone(), max_pages, max_depth),
            base,
            fetcher: Fetcher::new()?,
            knowledge_base: KnowledgeBase::new(),
            next_case_study_id: 1,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between pages; flipping it ends the crawl after the
    /// current page so partial results can be saved.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Sequential breadth-first crawl: one page fetch (and its politeness
    /// delay) completes before the next frontier item is dequeued.
    pub async fn crawl(mut self) -> CrawlOutcome {
        self.fetcher.load_robots(&self.base).await;

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );

        while let Some((url, depth)) = self.frontier.pop() {
            if self.shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested; stopping crawl with partial results");
                break;
            }
            pb.set_message(format!(
                "page {}: {url}",
                self.frontier.visited_count() + 1
            ));
            self.visit(&url, depth).await;
            pb.tick();
        }
        pb.finish_and_clear();

        self.knowledge_base.technologies.sort();
        self.knowledge_base.industries.sort();

        info!(
            "Crawl complete: {} pages visited, {} case studies, {} services, {} technologies, {} industries",
            self.frontier.visited_count(),
            self.knowledge_base.case_studies.len(),
            self.knowledge_base.services.len(),
            self.knowledge_base.technologies.len(),
            self.knowledge_base.industries.len(),
        );

        CrawlOutcome {
            pages_visited: self.frontier.visited_count(),
            knowledge_base: self.knowledge_base,
        }
    }

    async fn visit(&mut self, url: &str, depth: u32) {
        info!("Scraping: {url} (depth: {depth})");
        self.frontier.mark_visited(url);

        if let Some(html) = self.fetcher.fetch_page(url).await {
            self.process_page(&html, url, depth);
        }

        // Politeness: fixed delay whether the fetch succeeded or not.
        tokio::time::sleep(Duration::from_secs(REQUEST_DELAY_SECS)).await;
    }

    /// Per-page processing. The two extraction passes are independent; a
    /// barren result from one never prevents the other.
    fn process_page(&mut self, html: &str, url: &str, depth: u32) {
        let document = Html::parse_document(html);

        let drafts =
            case_studies::extract_case_studies(&document, url, &mut self.next_case_study_id);
        for cs in &drafts {
            info!("Extracted case study: {}", cs.client_name);
        }

        let found_services = services::extract_services(&document, url);
        if !found_services.is_empty() {
            info!("Extracted {} services", found_services.len());
        }

        let page_text = element_text(&document.root_element());
        let technologies = taxonomy::detect_technologies(&page_text);
        let industries = taxonomy::detect_industries(&page_text);

        info!(
            "Page summary: {} case studies, {} services, {} technologies, {} industries",
            drafts.len(),
            found_services.len(),
            technologies.len(),
            industries.len(),
        );

        self.knowledge_base.case_studies.extend(drafts);
        self.knowledge_base.services.extend(found_services);
        for tech in technologies {
            if !self.knowledge_base.technologies.contains(&tech) {
                self.knowledge_base.technologies.push(tech);
            }
        }
        for industry in industries {
            if !self.knowledge_base.industries.contains(&industry) {
                self.knowledge_base.industries.push(industry);
            }
        }

        if depth < self.frontier.max_depth() && !self.frontier.budget_exhausted() {
            let hrefs: Vec<String> = document
                .select(&ANCHOR_SEL)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string)
                .collect();
            let added = self.frontier.discover(url, &hrefs, depth + 1);
            info!("Added {added} URLs to queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn page(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{name}.html")).unwrap()
    }

    #[test]
    fn process_page_accumulates_without_duplicate_vocab() {
        let mut crawler = Crawler::new("https://example.com/", 30, 3).unwrap();
        let html = page("portfolio");
        crawler.process_page(&html, "https://example.com/work", 0);
        crawler.process_page(&html, "https://example.com/work", 0);

        let kb = &crawler.knowledge_base;
        assert!(!kb.case_studies.is_empty());
        let unique: HashSet<&String> = kb.technologies.iter().collect();
        assert_eq!(unique.len(), kb.technologies.len());
        let unique: HashSet<&String> = kb.industries.iter().collect();
        assert_eq!(unique.len(), kb.industries.len());
    }

    #[test]
    fn case_study_ids_stay_sequential_across_pages() {
        let mut crawler = Crawler::new("https://example.com/", 30, 3).unwrap();
        let html = page("portfolio");
        crawler.process_page(&html, "https://example.com/work", 0);
        crawler.process_page(&html, "https://example.com/projects", 0);

        let ids: Vec<i64> = crawler.knowledge_base.case_studies.iter().map(|c| c.id).collect();
        let expected: Vec<i64> = (1..=ids.len() as i64).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn link_discovery_respects_depth_budget() {
        let mut crawler = Crawler::new("https://example.com/", 30, 1).unwrap();
        while let Some((url, _)) = crawler.frontier.pop() {
            crawler.frontier.mark_visited(&url);
        }
        let html =
            r#"<html><body><a href="/insights/case-study/acme">Acme</a></body></html>"#;
        // depth == max_depth: outbound links are not harvested
        crawler.process_page(html, "https://example.com/work", 1);
        assert!(crawler.frontier.pop().is_none());
    }
}
