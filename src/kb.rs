use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_DESCRIPTION: &str = "No description available";

/// Legacy scraped field names mapped onto the canonical schema.
/// Applied at the JSON boundary so internal code never sees the synonyms.
const FIELD_MAP: &[(&str, &str)] = &[
    ("challenge", "problem"),
    ("business_impact", "results"),
    ("technologies_used", "technologies"),
    ("project_duration", "duration"),
    ("source_url", "url"),
];

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

fn no_description() -> String {
    NO_DESCRIPTION.to_string()
}

/// One client engagement: problem, solution, technologies, measurable result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudy {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub client_name: String,
    #[serde(default = "not_specified")]
    pub industry: String,
    #[serde(default = "not_specified")]
    pub problem: String,
    #[serde(default = "not_specified")]
    pub solution: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default = "not_specified")]
    pub results: String,
    #[serde(default = "not_specified")]
    pub duration: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extracted_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub name: String,
    #[serde(default = "no_description")]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// The unit of interchange. The four core keys always serialize, even when
/// empty; `company_info` and `pages` are opaque passthrough.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub case_studies: Vec<CaseStudy>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<serde_json::Value>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse a document, normalizing legacy field names.
    /// Missing file and malformed JSON are fatal here; callers that can
    /// degrade gracefully (the merger) handle the error themselves.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Knowledge base not found: {}", path.display()))?;
        let mut value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        if let Some(studies) = value.get_mut("case_studies").and_then(|v| v.as_array_mut()) {
            for study in studies {
                normalize_case_study_fields(study);
            }
        }

        let kb: KnowledgeBase = serde_json::from_value(value)
            .with_context(|| format!("Unexpected document shape in {}", path.display()))?;
        info!("Loaded {}: {} case studies", path.display(), kb.case_studies.len());
        Ok(kb)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved knowledge base to {}", path.display());
        Ok(())
    }

    /// Next free case-study id (ids are unique within a document).
    pub fn next_case_study_id(&self) -> i64 {
        self.case_studies.iter().map(|cs| cs.id).max().unwrap_or(0) + 1
    }
}

/// Rename legacy keys in place. A legacy key only moves when the canonical
/// key is absent, so already-canonical documents pass through untouched.
pub fn normalize_case_study_fields(study: &mut serde_json::Value) {
    let Some(obj) = study.as_object_mut() else {
        return;
    };
    for (legacy, canonical) in FIELD_MAP {
        if obj.contains_key(*legacy) && !obj.contains_key(*canonical) {
            if let Some(v) = obj.remove(*legacy) {
                obj.insert(canonical.to_string(), v);
            }
        }
    }
}

/// Copy `path` to `backup` before a destructive rewrite.
pub fn backup_file(path: &Path, backup: &Path) -> Result<()> {
    fs::copy(path, backup)
        .with_context(|| format!("Backup failed: {} -> {}", path.display(), backup.display()))?;
    info!("Backed up {} -> {}", path.display(), backup.display());
    Ok(())
}

/// Load a flat case-study array (the article pipeline's output format).
pub fn load_case_study_array(path: &Path) -> Result<Vec<CaseStudy>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("File not found: {}", path.display()))?;
    let mut values: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    for value in &mut values {
        normalize_case_study_fields(value);
    }
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(Into::into))
        .collect()
}

pub fn save_case_study_array(studies: &[CaseStudy], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(studies)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} case studies to {}", studies.len(), path.display());
    Ok(())
}

pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Warn-and-default loader used where a missing input is allowed.
pub fn load_lenient(path: &Path) -> Option<KnowledgeBase> {
    if !path.exists() {
        warn!("File not found: {}", path.display());
        return None;
    }
    match KnowledgeBase::load(path) {
        Ok(kb) => Some(kb),
        Err(e) => {
            warn!("Could not load {}: {e:#}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_normalized() {
        let mut value = serde_json::json!({
            "id": 3,
            "client_name": "Acme",
            "challenge": "Slow checkout flow",
            "business_impact": "Faster checkout",
            "technologies_used": ["React"],
            "project_duration": "3 months",
            "source_url": "https://example.com/work"
        });
        normalize_case_study_fields(&mut value);
        let cs: CaseStudy = serde_json::from_value(value).unwrap();
        assert_eq!(cs.problem, "Slow checkout flow");
        assert_eq!(cs.results, "Faster checkout");
        assert_eq!(cs.technologies, vec!["React"]);
        assert_eq!(cs.duration, "3 months");
        assert_eq!(cs.url, "https://example.com/work");
    }

    #[test]
    fn canonical_names_win_over_legacy() {
        let mut value = serde_json::json!({
            "problem": "canonical",
            "challenge": "legacy"
        });
        normalize_case_study_fields(&mut value);
        let cs: CaseStudy = serde_json::from_value(value).unwrap();
        assert_eq!(cs.problem, "canonical");
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let kb: KnowledgeBase = serde_json::from_str(r#"{"case_studies": []}"#).unwrap();
        assert!(kb.services.is_empty());
        assert!(kb.technologies.is_empty());
        assert!(kb.industries.is_empty());
    }

    #[test]
    fn missing_case_study_fields_get_sentinels() {
        let cs: CaseStudy = serde_json::from_str(r#"{"client_name": "Acme"}"#).unwrap();
        assert_eq!(cs.problem, NOT_SPECIFIED);
        assert_eq!(cs.solution, NOT_SPECIFIED);
        assert_eq!(cs.duration, NOT_SPECIFIED);
        assert!(cs.technologies.is_empty());
    }

    #[test]
    fn core_keys_always_serialize() {
        let json = serde_json::to_string(&KnowledgeBase::new()).unwrap();
        for key in ["case_studies", "services", "technologies", "industries"] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn company_info_passes_through_untouched() {
        let raw = r#"{
            "case_studies": [],
            "services": [],
            "technologies": [],
            "industries": [],
            "company_info": {"title": "Acme", "description": "d", "founded": 2010}
        }"#;
        let kb: KnowledgeBase = serde_json::from_str(raw).unwrap();
        let out = serde_json::to_value(&kb).unwrap();
        assert_eq!(out["company_info"]["founded"], 2010);
    }

    #[test]
    fn next_id_continues_from_max() {
        let mut kb = KnowledgeBase::new();
        assert_eq!(kb.next_case_study_id(), 1);
        kb.case_studies.push(CaseStudy {
            id: 7,
            ..serde_json::from_str("{}").unwrap()
        });
        assert_eq!(kb.next_case_study_id(), 8);
    }
}
