use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{element_classes, element_text, first_text};
use crate::kb::{Service, NO_DESCRIPTION};

/// Class tokens marking a service container.
const SERVICE_CLASS_KEYWORDS: &[&str] = &[
    "service", "offering", "solution", "what-we-do", "expertise", "capability", "what-we-offer",
];

/// Heading phrases marking a section as service-related.
const SERVICE_HEADING_PHRASES: &[&str] = &[
    "service", "what we do", "expertise", "offering", "solution", "we offer",
];

const BULLET_GLYPHS: &[char] = &['•', '-', '✓', '→', '*'];
const MAX_CAPABILITIES: usize = 5;
const DESCRIPTION_CAP_CHARS: usize = 500;

static CLASSED_ANY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class]").unwrap());
static SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section, div, article").unwrap());
static SECTION_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").unwrap());
static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, li, article, section").unwrap());
static ITEM_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4").unwrap());
static BOLD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong, b").unwrap());
static PARAGRAPH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static LIST_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul, ol").unwrap());
static LIST_ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());

/// Independent services pass: locate service containers by class token or
/// heading phrase, then pull a titled item with description and up to five
/// capability bullets out of each. Deduplicates by exact title within the
/// page.
pub fn extract_services(document: &Html, url: &str) -> Vec<Service> {
    let mut services = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let containers = service_containers(document);
    debug!("Found {} potential service containers on {url}", containers.len());

    for container in containers {
        for item in container.select(&ITEM_SEL) {
            let Some(name) = first_text(&item, &ITEM_HEADING_SEL)
                .or_else(|| first_text(&item, &BOLD_SEL))
            else {
                continue;
            };

            if name.chars().count() < 3 || seen.contains(&name) {
                continue;
            }

            let description = first_text(&item, &PARAGRAPH_SEL).unwrap_or_default();

            // Both title and description must show some substance.
            if description.chars().count() < 50 && name.chars().count() < 10 {
                warn!("Skipping service '{name}': content too short");
                continue;
            }

            let capabilities = extract_capabilities(&item);

            seen.insert(name.clone());
            debug!("Found service: {name}");
            services.push(Service {
                name,
                description: if description.is_empty() {
                    NO_DESCRIPTION.to_string()
                } else {
                    description.chars().take(DESCRIPTION_CAP_CHARS).collect()
                },
                capabilities,
                url: url.to_string(),
                source: String::new(),
            });
        }
    }

    services
}

fn service_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let mut containers: Vec<ElementRef> = document
        .select(&CLASSED_ANY_SEL)
        .filter(|el| {
            let classes = element_classes(el);
            SERVICE_CLASS_KEYWORDS.iter().any(|kw| classes.contains(kw))
        })
        .collect();

    for section in document.select(&SECTION_SEL) {
        if let Some(heading) = first_text(&section, &SECTION_HEADING_SEL) {
            let heading_lower = heading.to_lowercase();
            if SERVICE_HEADING_PHRASES.iter().any(|p| heading_lower.contains(p)) {
                containers.push(section);
            }
        }
    }

    containers
}

/// Capability bullets: list items first, then lines that start with a bullet
/// glyph. Capped at five.
fn extract_capabilities(item: &ElementRef) -> Vec<String> {
    let mut capabilities = Vec::new();

    'lists: for list in item.select(&LIST_SEL).take(2) {
        for li in list.select(&LIST_ITEM_SEL).take(MAX_CAPABILITIES) {
            let text = element_text(&li);
            if text.chars().count() > 5 {
                capabilities.push(text);
                if capabilities.len() >= MAX_CAPABILITIES {
                    break 'lists;
                }
            }
        }
    }

    if capabilities.is_empty() {
        let all_text: String = item
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        for line in all_text.lines().take(10) {
            let line = line.trim();
            if line.starts_with(BULLET_GLYPHS) {
                let clean: &str = line.trim_start_matches(|c: char| {
                    BULLET_GLYPHS.contains(&c) || c == ' '
                });
                let count = clean.chars().count();
                if count > 5 && count < 200 {
                    capabilities.push(clean.to_string());
                    if capabilities.len() >= MAX_CAPABILITIES {
                        break;
                    }
                }
            }
        }
    }

    capabilities
}
