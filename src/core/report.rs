use crate::domain::model::RiskAssessment;
use crate::utils::error::{Result, RiskError};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const JSON_REPORT: &str = "risk_assessment.json";
pub const CSV_REPORT: &str = "risk_assessment.csv";

/// One row per condition, factors and steps joined with "; ".
pub fn render_csv(assessment: &RiskAssessment) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "condition",
        "risk_score",
        "risk_level",
        "contributing_factors",
        "prevention_steps",
        "screening_steps",
    ])?;

    for result in &assessment.results {
        writer.write_record([
            result.condition.name().to_string(),
            result.risk_score.to_string(),
            result.risk_level.as_str().to_string(),
            result.contributing_factors.join("; "),
            result.prevention_steps.join("; "),
            result.screening_steps.join("; "),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| RiskError::ProcessingError {
        message: format!("Failed to flush CSV writer: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| RiskError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub fn render_json(assessment: &RiskAssessment) -> Result<String> {
    Ok(serde_json::to_string_pretty(assessment)?)
}

/// Packs `(name, contents)` pairs into an in-memory ZIP archive.
pub fn bundle(files: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, contents) in files {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(contents.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
