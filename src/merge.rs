use std::collections::BTreeSet;
use std::collections::HashSet;

use anyhow::{bail, Result};
use tracing::info;

use crate::kb::{CaseStudy, KnowledgeBase, Service};

pub struct Merged {
    pub kb: KnowledgeBase,
    pub duplicate_services: usize,
    pub duplicate_technologies: usize,
    pub duplicate_industries: usize,
}

/// Reconcile the manual and auto documents into one. Fails only when both
/// inputs are absent; a single missing input contributes nothing instead of
/// erroring. Deterministic: same inputs, same output.
pub fn merge(manual: Option<&KnowledgeBase>, auto: Option<&KnowledgeBase>) -> Result<Merged> {
    if manual.is_none() && auto.is_none() {
        bail!("Both knowledge bases failed to load; cannot merge");
    }

    let empty = KnowledgeBase::new();
    let manual = manual.unwrap_or(&empty);
    let auto = auto.unwrap_or(&empty);

    let case_studies = merge_case_studies(manual, auto);
    let (services, duplicate_services) = merge_services(manual, auto);
    let (technologies, duplicate_technologies) =
        merge_vocabulary(&manual.technologies, &auto.technologies);
    let (industries, duplicate_industries) =
        merge_vocabulary(&manual.industries, &auto.industries);

    info!(
        "Merged: {} case studies, {} services ({} duplicates), {} technologies, {} industries",
        case_studies.len(),
        services.len(),
        duplicate_services,
        technologies.len(),
        industries.len(),
    );

    Ok(Merged {
        kb: KnowledgeBase {
            case_studies,
            services,
            technologies,
            industries,
            company_info: manual.company_info.clone().or_else(|| auto.company_info.clone()),
            pages: if manual.pages.is_empty() {
                auto.pages.clone()
            } else {
                manual.pages.clone()
            },
        },
        duplicate_services,
        duplicate_technologies,
        duplicate_industries,
    })
}

/// Order-preserving concatenation, manual entries first, each copy tagged
/// with its provenance. No cross-source dedup by content; ids are
/// reassigned sequentially so the merged document keeps them unique.
fn merge_case_studies(manual: &KnowledgeBase, auto: &KnowledgeBase) -> Vec<CaseStudy> {
    let tag = |studies: &[CaseStudy], source: &str| -> Vec<CaseStudy> {
        studies
            .iter()
            .map(|cs| {
                let mut copy = cs.clone();
                copy.metadata.insert("source".to_string(), source.to_string());
                copy
            })
            .collect()
    };

    let mut all = tag(&manual.case_studies, "manual");
    all.extend(tag(&auto.case_studies, "auto"));
    for (i, cs) in all.iter_mut().enumerate() {
        cs.id = i as i64 + 1;
    }
    all
}

/// Deduplicate by case-insensitive trimmed name; manual entries always win.
/// Records without a name are dropped silently and don't count as
/// duplicates.
fn merge_services(manual: &KnowledgeBase, auto: &KnowledgeBase) -> (Vec<Service>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<Service> = Vec::new();
    let mut duplicates = 0;

    for (services, source) in [(&manual.services, "manual"), (&auto.services, "auto")] {
        for service in services.iter() {
            let name = service.name.trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_lowercase()) {
                let mut copy = service.clone();
                copy.source = source.to_string();
                merged.push(copy);
            } else {
                duplicates += 1;
            }
        }
    }

    (merged, duplicates)
}

/// Set-union of trimmed non-empty strings, sorted ascending. The duplicate
/// count is (manual + auto) - final.
fn merge_vocabulary(manual: &[String], auto: &[String]) -> (Vec<String>, usize) {
    let union: BTreeSet<String> = manual
        .iter()
        .chain(auto.iter())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let merged: Vec<String> = union.into_iter().collect();
    let duplicates = (manual.len() + auto.len()).saturating_sub(merged.len());
    (merged, duplicates)
}

pub struct AppendOutcome {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Fold newly scraped case studies into an existing document, skipping any
/// whose `url` is already present. Distinct from the full merger above,
/// which concatenates without URL dedup. Appended records are renumbered to
/// continue from the target's max id.
pub fn append_case_studies(kb: &mut KnowledgeBase, scraped: Vec<CaseStudy>) -> AppendOutcome {
    let mut existing_urls: HashSet<String> =
        kb.case_studies.iter().map(|cs| cs.url.clone()).collect();
    let mut next_id = kb.next_case_study_id();

    let mut added = 0;
    let mut skipped = 0;

    for mut cs in scraped {
        if existing_urls.contains(&cs.url) {
            info!("Skipping duplicate: {} ({})", cs.client_name, cs.url);
            skipped += 1;
            continue;
        }
        info!("Added: {} ({})", cs.client_name, cs.url);
        existing_urls.insert(cs.url.clone());
        cs.id = next_id;
        next_id += 1;
        kb.case_studies.push(cs);
        added += 1;
    }

    AppendOutcome {
        added,
        skipped,
        total: kb.case_studies.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study(client_name: &str, url: &str) -> CaseStudy {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "client_name": client_name,
            "problem": "p".repeat(40),
            "solution": "s".repeat(60),
            "technologies": ["React"],
            "url": url,
        }))
        .unwrap()
    }

    fn service(name: &str, description: &str) -> Service {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "description": description,
        }))
        .unwrap()
    }

    fn kb(
        studies: Vec<CaseStudy>,
        services: Vec<Service>,
        technologies: &[&str],
        industries: &[&str],
    ) -> KnowledgeBase {
        KnowledgeBase {
            case_studies: studies,
            services,
            technologies: technologies.iter().map(|s| s.to_string()).collect(),
            industries: industries.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn both_inputs_missing_is_fatal() {
        assert!(merge(None, None).is_err());
    }

    #[test]
    fn single_input_degrades_to_copy() {
        let auto = kb(
            vec![study("Acme", "https://a.com/1")],
            vec![service("Cloud Migration", "desc")],
            &["React", "AWS"],
            &["SaaS"],
        );
        let merged = merge(None, Some(&auto)).unwrap();
        assert_eq!(merged.kb.case_studies.len(), 1);
        assert_eq!(merged.kb.case_studies[0].metadata.get("source").unwrap(), "auto");
        assert_eq!(merged.kb.services.len(), 1);
        assert_eq!(merged.kb.technologies, vec!["AWS", "React"]);
        assert_eq!(merged.kb.industries, vec!["SaaS"]);
    }

    #[test]
    fn manual_service_wins_on_name_collision() {
        let manual = kb(vec![], vec![service("Cloud Migration", "manual version")], &[], &[]);
        let auto = kb(vec![], vec![service("  cloud migration ", "auto version")], &[], &[]);
        let merged = merge(Some(&manual), Some(&auto)).unwrap();
        assert_eq!(merged.kb.services.len(), 1);
        assert_eq!(merged.kb.services[0].description, "manual version");
        assert_eq!(merged.kb.services[0].source, "manual");
        assert_eq!(merged.duplicate_services, 1);
    }

    #[test]
    fn empty_service_names_dropped_silently() {
        let auto = kb(vec![], vec![service("", "x"), service("  ", "y")], &[], &[]);
        let merged = merge(None, Some(&auto)).unwrap();
        assert!(merged.kb.services.is_empty());
        assert_eq!(merged.duplicate_services, 0);
    }

    #[test]
    fn vocabulary_union_is_commutative() {
        let a = kb(vec![], vec![], &["React", "AWS"], &["SaaS"]);
        let b = kb(vec![], vec![], &["AWS", "Docker"], &["FinTech", "SaaS"]);
        let ab = merge(Some(&a), Some(&b)).unwrap();
        let ba = merge(Some(&b), Some(&a)).unwrap();
        assert_eq!(ab.kb.technologies, ba.kb.technologies);
        assert_eq!(ab.kb.technologies, vec!["AWS", "Docker", "React"]);
        assert_eq!(ab.kb.industries, ba.kb.industries);
        assert_eq!(ab.duplicate_technologies, 1);
        assert_eq!(ab.duplicate_industries, 1);
    }

    #[test]
    fn case_studies_concatenate_manual_first_without_dedup() {
        let manual = kb(vec![study("Acme", "https://a.com/1")], vec![], &[], &[]);
        let auto = kb(vec![study("Acme", "https://a.com/1")], vec![], &[], &[]);
        let merged = merge(Some(&manual), Some(&auto)).unwrap();
        // Same client and URL in both inputs yields two entries
        assert_eq!(merged.kb.case_studies.len(), 2);
        assert_eq!(merged.kb.case_studies[0].metadata.get("source").unwrap(), "manual");
        assert_eq!(merged.kb.case_studies[1].metadata.get("source").unwrap(), "auto");
        // Ids reassigned to stay unique within the document
        assert_eq!(merged.kb.case_studies[0].id, 1);
        assert_eq!(merged.kb.case_studies[1].id, 2);
    }

    #[test]
    fn merge_is_deterministic() {
        let manual = kb(
            vec![study("Acme", "https://a.com/1")],
            vec![service("A", "d")],
            &["React"],
            &["SaaS"],
        );
        let auto = kb(
            vec![study("Zen", "https://z.com/1")],
            vec![service("B", "d")],
            &["AWS"],
            &["Retail"],
        );
        let once = merge(Some(&manual), Some(&auto)).unwrap();
        let twice = merge(Some(&manual), Some(&auto)).unwrap();
        assert_eq!(
            serde_json::to_value(&once.kb).unwrap(),
            serde_json::to_value(&twice.kb).unwrap()
        );
    }

    #[test]
    fn append_skips_existing_urls_and_tracks_new_ones() {
        let mut target = kb(vec![study("Acme", "https://a.com/1")], vec![], &[], &[]);
        let scraped = vec![
            study("Dup", "https://a.com/1"),
            study("New", "https://a.com/2"),
            study("New Again", "https://a.com/2"),
        ];
        let outcome = append_case_studies(&mut target, scraped);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.total, 2);
        assert_eq!(target.case_studies[1].client_name, "New");
        assert_eq!(target.case_studies[1].id, 2);
    }
}
