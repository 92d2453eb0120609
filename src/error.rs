//! Error types for rust-rdlmigrate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a report
#[derive(Error, Debug)]
pub enum RdlMigrateError {
    #[error("Failed to read report file: {path}")]
    ReportReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse XML in {context}")]
    XmlParseError {
        context: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Report not found: {path}")]
    ReportNotFound { path: String },

    #[error("Can't find corresponding shared dataset {reference} for dataset {data_set}")]
    MissingCanonicalDataset { data_set: String, reference: String },

    #[error("Shared dataset reference {reference} for dataset {data_set} matches several definitions: {candidates}")]
    AmbiguousSharedDataset {
        data_set: String,
        reference: String,
        candidates: String,
    },

    #[error("Illegal file - {element} has {count} Filters elements, at most 1 is allowed")]
    MalformedFilterStructure { element: String, count: usize },

    #[error("Invalid shared dataset {name}: {message}")]
    InvalidCanonicalDataset { name: String, message: String },

    #[error("Invalid dataset stub: {message}")]
    InvalidDataSetStub { message: String },

    #[error("Data source {name} still references {reference} and was never resolved")]
    UnresolvedDataSource { name: String, reference: String },

    #[error("Invalid data source file {path}: {message}")]
    InvalidDataSourceFile { path: PathBuf, message: String },

    #[error("Invalid shared dataset file {path}: {message}")]
    InvalidSharedDataSetFile { path: PathBuf, message: String },

    #[error("Failed to write output to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML generation error: {message}")]
    XmlWriteError { message: String },

    #[error("Schema validation failed for {path}: {message}")]
    SchemaValidationError { path: PathBuf, message: String },
}

