use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::kb::KnowledgeBase;

/// One indexable record for the external embedding/similarity service: an
/// opaque text blob plus a small metadata map. No embedding happens here.
#[derive(Debug, Serialize)]
pub struct Doc {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn value_str<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Map every record of a knowledge base to retrieval documents: company
/// info, pages, case studies (rich multi-field text), and services.
pub fn build_documents(kb: &KnowledgeBase) -> Vec<Doc> {
    let mut documents = Vec::new();

    if let Some(info) = &kb.company_info {
        documents.push(Doc {
            content: format!(
                "{}\n{}",
                value_str(info, "title"),
                value_str(info, "description")
            ),
            metadata: meta(&[("source", "company_info"), ("type", "company")]),
        });
    }

    for page in &kb.pages {
        documents.push(Doc {
            content: format!(
                "Title: {}\nContent: {}",
                value_str(page, "title"),
                value_str(page, "content")
            ),
            metadata: meta(&[("source", value_str(page, "url")), ("type", "page")]),
        });
    }

    for cs in &kb.case_studies {
        let technologies = cs.technologies.join(", ");
        let content = format!(
            "Case Study: {}\nIndustry: {}\n\nProblem:\n{}\n\nSolution:\n{}\n\n\
             Technologies Used: {}\n\nResults:\n{}\n\nDuration: {}",
            cs.client_name, cs.industry, cs.problem, cs.solution,
            technologies, cs.results, cs.duration,
        );
        documents.push(Doc {
            content,
            metadata: meta(&[
                ("source", "case_study"),
                ("type", "case_study"),
                ("client_name", &cs.client_name),
                ("industry", &cs.industry),
                ("technologies", &technologies),
            ]),
        });
    }

    for service in &kb.services {
        documents.push(Doc {
            content: format!("Service: {}\nDescription: {}", service.name, service.description),
            metadata: meta(&[("source", "service"), ("type", "service")]),
        });
    }

    info!("Built {} retrieval documents", documents.len());
    documents
}

/// Write the documents as JSONL for the indexing service.
pub fn export_jsonl(kb: &KnowledgeBase, path: &Path) -> Result<usize> {
    let documents = build_documents(kb);
    let mut out = String::new();
    for doc in &documents {
        out.push_str(&serde_json::to_string(doc)?);
        out.push('\n');
    }
    fs::write(path, out)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(documents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{CaseStudy, Service};

    fn sample_kb() -> KnowledgeBase {
        let cs: CaseStudy = serde_json::from_value(serde_json::json!({
            "id": 1,
            "client_name": "Acme Inc",
            "industry": "SaaS",
            "problem": "Slow builds",
            "solution": "Faster builds",
            "technologies": ["React", "AWS"],
            "results": "50% faster",
        }))
        .unwrap();
        let service: Service = serde_json::from_value(serde_json::json!({
            "name": "Engineering",
            "description": "We build things",
        }))
        .unwrap();
        KnowledgeBase {
            case_studies: vec![cs],
            services: vec![service],
            company_info: Some(serde_json::json!({"title": "Acme", "description": "dev shop"})),
            pages: vec![serde_json::json!({
                "title": "About",
                "content": "Who we are",
                "url": "https://a.com/about"
            })],
            ..Default::default()
        }
    }

    #[test]
    fn every_record_becomes_one_document() {
        let docs = build_documents(&sample_kb());
        // company info + page + case study + service
        assert_eq!(docs.len(), 4);
    }

    #[test]
    fn case_study_metadata_carries_retrieval_keys() {
        let docs = build_documents(&sample_kb());
        let cs_doc = docs
            .iter()
            .find(|d| d.metadata.get("type").map(String::as_str) == Some("case_study"))
            .unwrap();
        assert_eq!(cs_doc.metadata.get("client_name").unwrap(), "Acme Inc");
        assert_eq!(cs_doc.metadata.get("industry").unwrap(), "SaaS");
        assert_eq!(cs_doc.metadata.get("technologies").unwrap(), "React, AWS");
        assert!(cs_doc.content.contains("Problem:\nSlow builds"));
        assert!(cs_doc.content.contains("Technologies Used: React, AWS"));
    }

    #[test]
    fn page_document_uses_url_as_source() {
        let docs = build_documents(&sample_kb());
        let page_doc = docs
            .iter()
            .find(|d| d.metadata.get("type").map(String::as_str) == Some("page"))
            .unwrap();
        assert_eq!(page_doc.metadata.get("source").unwrap(), "https://a.com/about");
    }

    #[test]
    fn empty_kb_builds_nothing() {
        assert!(build_documents(&KnowledgeBase::new()).is_empty());
    }
}
