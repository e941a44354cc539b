use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::kb::normalize_case_study_fields;

const REQUIRED_KEYS: &[&str] = &["case_studies", "services", "technologies", "industries"];

const CASE_STUDY_REQUIRED_FIELDS: &[&str] =
    &["client_name", "industry", "problem", "solution", "technologies", "results"];

const SERVICE_REQUIRED_FIELDS: &[&str] = &["name", "description"];

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub case_study_count: usize,
    pub service_count: usize,
    pub technology_count: usize,
    pub industry_count: usize,
}

impl ValidationReport {
    /// Structural errors fail outright; empty vocabularies also fail since
    /// they mean detection produced nothing usable.
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.technology_count > 0 && self.industry_count > 0
    }
}

/// Validate a document file. A missing or unparseable file is fatal;
/// everything else lands in the report.
pub fn validate_file(path: &Path) -> Result<ValidationReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Output file not found: {}", path.display()))?;
    if raw.trim().is_empty() {
        anyhow::bail!("Output file is empty: {}", path.display());
    }
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    info!("Loaded {} for validation", path.display());
    Ok(validate_document(&data))
}

pub fn validate_document(data: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    for key in REQUIRED_KEYS {
        match data.get(key) {
            None => report.errors.push(format!("Missing required key: '{key}'")),
            Some(v) if !v.is_array() => {
                report.errors.push(format!("Key '{key}' should be a list"));
            }
            Some(_) => {}
        }
    }

    validate_case_studies(data, &mut report);
    validate_services(data, &mut report);
    validate_vocabulary(data, "technologies", &mut report);
    validate_vocabulary(data, "industries", &mut report);

    report.technology_count = array_len(data, "technologies");
    report.industry_count = array_len(data, "industries");

    report
}

fn array_len(data: &Value, key: &str) -> usize {
    data.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

fn validate_case_studies(data: &Value, report: &mut ValidationReport) {
    let Some(studies) = data.get("case_studies").and_then(Value::as_array) else {
        return;
    };
    report.case_study_count = studies.len();

    if studies.is_empty() {
        report
            .warnings
            .push("No case studies found (may be expected for some sites)".to_string());
        return;
    }

    for (i, study) in studies.iter().enumerate() {
        let n = i + 1;
        let mut study = study.clone();
        normalize_case_study_fields(&mut study);

        let missing: Vec<&str> = CASE_STUDY_REQUIRED_FIELDS
            .iter()
            .filter(|f| study.get(**f).is_none())
            .copied()
            .collect();
        if !missing.is_empty() {
            report
                .warnings
                .push(format!("Case study #{n} missing fields: {}", missing.join(", ")));
        }

        if let Some(name) = study.get("client_name").and_then(Value::as_str) {
            if name.chars().count() < 2 {
                report.warnings.push(format!("Case study #{n} has invalid client_name"));
            }
        }

        match study.get("technologies") {
            Some(Value::Array(techs)) if techs.is_empty() => {
                report
                    .warnings
                    .push(format!("Case study #{n} has no technologies listed"));
            }
            Some(Value::Array(_)) | None => {}
            Some(_) => {
                report
                    .errors
                    .push(format!("Case study #{n}: 'technologies' should be a list"));
            }
        }
    }
}

fn validate_services(data: &Value, report: &mut ValidationReport) {
    let Some(services) = data.get("services").and_then(Value::as_array) else {
        return;
    };
    report.service_count = services.len();

    for (i, service) in services.iter().enumerate() {
        let missing: Vec<&str> = SERVICE_REQUIRED_FIELDS
            .iter()
            .filter(|f| service.get(**f).is_none())
            .copied()
            .collect();
        if !missing.is_empty() {
            report
                .warnings
                .push(format!("Service #{} missing fields: {}", i + 1, missing.join(", ")));
        }
    }
}

fn validate_vocabulary(data: &Value, key: &str, report: &mut ValidationReport) {
    let Some(entries) = data.get(key).and_then(Value::as_array) else {
        return;
    };

    if entries.is_empty() {
        report
            .warnings
            .push(format!("No {key} found - detection may have failed"));
        return;
    }

    for (i, entry) in entries.iter().enumerate() {
        match entry.as_str() {
            None => report
                .errors
                .push(format!("{key} #{} is not a string", i + 1)),
            Some(s) if s.trim().is_empty() => {
                report.warnings.push(format!("{key} #{} is empty", i + 1));
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_document_passes() {
        let data = json!({
            "case_studies": [{
                "client_name": "Acme Inc",
                "industry": "SaaS",
                "problem": "p",
                "solution": "s",
                "technologies": ["React"],
                "results": "r"
            }],
            "services": [{"name": "Engineering", "description": "d"}],
            "technologies": ["React"],
            "industries": ["SaaS"]
        });
        let report = validate_document(&data);
        assert!(report.passed(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(report.case_study_count, 1);
    }

    #[test]
    fn legacy_field_names_accepted() {
        let data = json!({
            "case_studies": [{
                "client_name": "Acme Inc",
                "industry": "SaaS",
                "challenge": "p",
                "solution": "s",
                "technologies_used": ["React"],
                "business_impact": "r"
            }],
            "services": [],
            "technologies": ["React"],
            "industries": ["SaaS"]
        });
        let report = validate_document(&data);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn missing_top_level_key_is_error() {
        let data = json!({"case_studies": [], "services": [], "technologies": []});
        let report = validate_document(&data);
        assert!(report.errors.iter().any(|e| e.contains("'industries'")));
        assert!(!report.passed());
    }

    #[test]
    fn missing_case_study_fields_warn() {
        let data = json!({
            "case_studies": [{"client_name": "Acme Inc"}],
            "services": [],
            "technologies": ["React"],
            "industries": ["SaaS"]
        });
        let report = validate_document(&data);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("Case study #1 missing fields:")));
    }

    #[test]
    fn non_list_technologies_is_error() {
        let data = json!({
            "case_studies": [{
                "client_name": "Acme Inc",
                "industry": "SaaS",
                "problem": "p",
                "solution": "s",
                "technologies": "React",
                "results": "r"
            }],
            "services": [],
            "technologies": ["React"],
            "industries": ["SaaS"]
        });
        let report = validate_document(&data);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("'technologies' should be a list")));
    }

    #[test]
    fn empty_vocabularies_fail_without_erroring() {
        let data = json!({
            "case_studies": [],
            "services": [],
            "technologies": [],
            "industries": []
        });
        let report = validate_document(&data);
        assert!(report.errors.is_empty());
        assert!(!report.passed());
    }
}
