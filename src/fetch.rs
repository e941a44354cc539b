use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; KbScraperBot/2.0)";
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Responses below this length carry no meaningful content.
const MIN_CONTENT_CHARS: usize = 100;

/// HTTP fetcher with a cached robots.txt policy for one host.
pub struct Fetcher {
    client: reqwest::Client,
    robots: RobotsPolicy,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            robots: RobotsPolicy::default(),
        })
    }

    /// Load and cache robots.txt for the base host. Unavailability is
    /// fail-open: crawling proceeds unrestricted with a warning.
    pub async fn load_robots(&mut self, base: &Url) {
        let robots_url = match base.join("/robots.txt") {
            Ok(u) => u,
            Err(_) => return,
        };
        info!("Checking robots.txt at {robots_url}");
        match self.get_text(robots_url.as_str()).await {
            Ok(body) => {
                self.robots = RobotsPolicy::parse(&body);
                info!(
                    "robots.txt loaded ({} disallow rules)",
                    self.robots.disallowed.len()
                );
            }
            Err(e) => {
                warn!("Could not read robots.txt: {e:#}; proceeding unrestricted");
                self.robots = RobotsPolicy::default();
            }
        }
    }

    pub fn can_fetch(&self, url: &str) -> bool {
        self.robots.allows(url)
    }

    /// Fetch a page, or `None` on any page-local failure. Failures are
    /// classified and logged; none of them aborts the crawl.
    pub async fn fetch_page(&self, url: &str) -> Option<String> {
        if !self.can_fetch(url) {
            warn!("Blocked by robots.txt: {url}");
            return None;
        }

        info!("Fetching: {url}");
        match self.get_text(url).await {
            Ok(body) if body.chars().count() < MIN_CONTENT_CHARS => {
                warn!("Skipping {url}: content too short ({} chars)", body.len());
                None
            }
            Ok(body) => {
                info!("Fetched {url} ({} bytes)", body.len());
                Some(body)
            }
            Err(e) => {
                error!("{} fetching {url}: {e:#}", classify_fetch_error(&e));
                None
            }
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Distinct cause labels for the crawl log; all are non-fatal.
fn classify_fetch_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "Timeout error"
    } else if e.is_status() {
        "HTTP error"
    } else if e.is_connect() {
        "Connection error"
    } else {
        "Request error"
    }
}

/// Disallow rules from the `*` user-agent groups of a robots.txt file.
/// An empty policy allows everything.
#[derive(Debug, Default)]
pub struct RobotsPolicy {
    disallowed: Vec<String>,
}

impl RobotsPolicy {
    pub fn parse(body: &str) -> Self {
        let mut disallowed = Vec::new();
        let mut applies_to_us = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match field.trim().to_lowercase().as_str() {
                "user-agent" => applies_to_us = value == "*",
                "disallow" if applies_to_us && !value.is_empty() => {
                    disallowed.push(value.to_string());
                }
                _ => {}
            }
        }

        Self { disallowed }
    }

    pub fn allows(&self, url: &str) -> bool {
        let path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        !self.disallowed.iter().any(|rule| path.starts_with(rule.as_str()))
    }
}
