//! XSD validation of converted reports

use std::path::Path;

use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};

use crate::error::RdlMigrateError;

/// Validate report XML against the report definition schema at `schema`.
///
/// `report` only labels errors.
pub fn validate_report_xml(xml: &str, schema: &Path, report: &Path) -> Result<(), RdlMigrateError> {
    let fail = |message: String| RdlMigrateError::SchemaValidationError {
        path: report.to_path_buf(),
        message,
    };

    let mut schema_parser = SchemaParserContext::from_file(&schema.to_string_lossy());
    let mut validation_ctx = SchemaValidationContext::from_parser(&mut schema_parser)
        .map_err(|errors| fail(format!("invalid schema {}: {}", schema.display(), messages(&errors))))?;

    let doc = Parser::default()
        .parse_string(xml)
        .map_err(|e| fail(format!("failed to parse: {:?}", e)))?;

    validation_ctx
        .validate_document(&doc)
        .map_err(|errors| fail(messages(&errors)))
}

fn messages(errors: &[libxml::error::StructuredError]) -> String {
    errors
        .iter()
        .map(|e| {
            e.message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}
