pub mod article;
pub mod case_studies;
pub mod patterns;
pub mod services;
pub mod taxonomy;

use scraper::{ElementRef, Selector};

/// Visible text of an element: text nodes trimmed and space-joined.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased class attribute of an element, empty when absent.
pub(crate) fn element_classes(element: &ElementRef) -> String {
    element
        .value()
        .attr("class")
        .unwrap_or_default()
        .to_lowercase()
}

/// Text of the first descendant matching `selector`, if any.
pub(crate) fn first_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}
