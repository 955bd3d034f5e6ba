//! [`Report`] → JSON / YAML serialization.

use crate::error::SerializeError;
use crate::report::Report;

/// Output format for [`serialize_report`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// Serialize a report. Outcomes keep rule order.
pub fn serialize_report(report: &Report, format: Format) -> Result<String, SerializeError> {
    // Convert to serde_json::Value first for consistent field ordering
    let value = serde_json::to_value(report).map_err(|e| SerializeError {
        message: format!("failed to convert report to JSON value: {}", e),
    })?;

    match format {
        Format::Json => serde_json::to_string_pretty(&value).map_err(|e| SerializeError {
            message: format!("failed to serialize to JSON: {}", e),
        }),
        Format::Yaml => serde_saphyr::to_string(&value).map_err(|e| SerializeError {
            message: format!("failed to serialize to YAML: {}", e),
        }),
    }
}
