//! Data source definitions and the `.rds` sidecar reader

use std::path::Path;
use std::str::FromStr;

use roxmltree::Document;

use super::registry::DataSourceNameCache;
use crate::convert::constants::{
    CONNECT_STRING, CREDENTIAL_RETRIEVAL, DATA_SOURCES, DATA_SOURCE_DEFINITION,
    DATA_SOURCE_REFERENCE, ENABLED, EXTENSION, NAME, ORIGINAL_CONNECT_STRING_EXPRESSION_BASED,
    REFERENCE, USE_ORIGINAL_CONNECT_STRING,
};
use crate::error::RdlMigrateError;

/// How a data source obtains credentials at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialRetrieval {
    Integrated,
    Store,
    Prompt,
    None,
}

impl FromStr for CredentialRetrieval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "integrated" => Ok(CredentialRetrieval::Integrated),
            "store" => Ok(CredentialRetrieval::Store),
            "prompt" => Ok(CredentialRetrieval::Prompt),
            "none" => Ok(CredentialRetrieval::None),
            _ => Err(format!("Unknown credential retrieval: {}", s)),
        }
    }
}

/// A fully resolved data source definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceDefinition {
    /// Data extension (e.g., "SQL", "OLEDB")
    pub extension: String,
    pub connect_string: String,
    pub use_original_connect_string: bool,
    pub original_connect_string_expression_based: bool,
    pub credential_retrieval: CredentialRetrieval,
    pub enabled: bool,
}

/// Path of a shared data source on the report server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceReference {
    pub reference: String,
}

/// Either a definition or a reference, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceItem {
    Definition(DataSourceDefinition),
    Reference(DataSourceReference),
}

/// A named data source as supplied to the converter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub item: DataSourceItem,
}

impl DataSource {
    pub fn definition(name: impl Into<String>, definition: DataSourceDefinition) -> Self {
        Self {
            name: name.into(),
            item: DataSourceItem::Definition(definition),
        }
    }

    pub fn reference(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item: DataSourceItem::Reference(DataSourceReference {
                reference: reference.into(),
            }),
        }
    }
}

/// Read a `.rds` data source list.
///
/// Entries carrying a `Reference` attribute but no `Name` come from shared
/// datasets; they are named through `names` so they match the
/// `DataSourceName` the data set embedder writes for the same reference.
pub fn read_data_source_file(
    path: &Path,
    names: &DataSourceNameCache,
) -> Result<Vec<DataSource>, RdlMigrateError> {
    let bytes = std::fs::read(path).map_err(|e| RdlMigrateError::ReportReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let content = crate::util::decode_text(&bytes).map_err(|e| RdlMigrateError::ReportReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_data_sources(&content, names).map_err(|err| match err {
        DataSourceFileError::Xml(source) => RdlMigrateError::XmlParseError {
            context: path.display().to_string(),
            source,
        },
        DataSourceFileError::Invalid(message) => RdlMigrateError::InvalidDataSourceFile {
            path: path.to_path_buf(),
            message,
        },
    })
}

#[derive(Debug)]
enum DataSourceFileError {
    Xml(roxmltree::Error),
    Invalid(String),
}

fn parse_data_sources(
    content: &str,
    names: &DataSourceNameCache,
) -> Result<Vec<DataSource>, DataSourceFileError> {
    let doc = Document::parse(content).map_err(DataSourceFileError::Xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != DATA_SOURCES {
        return Err(DataSourceFileError::Invalid(format!(
            "expected root element {}, found {}",
            DATA_SOURCES,
            root.tag_name().name()
        )));
    }

    let mut data_sources = Vec::new();
    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            DATA_SOURCE_DEFINITION => data_sources.push(parse_definition(&node, names)?),
            DATA_SOURCE_REFERENCE => {
                let name = required_attribute(&node, NAME)?;
                let reference = child_text(&node, REFERENCE).ok_or_else(|| {
                    DataSourceFileError::Invalid(format!("{} has no {}", name, REFERENCE))
                })?;
                data_sources.push(DataSource::reference(name, reference));
            }
            other => {
                return Err(DataSourceFileError::Invalid(format!(
                    "unexpected element {}",
                    other
                )))
            }
        }
    }

    Ok(data_sources)
}

fn parse_definition(
    node: &roxmltree::Node,
    names: &DataSourceNameCache,
) -> Result<DataSource, DataSourceFileError> {
    let name = match (node.attribute(NAME), node.attribute(REFERENCE)) {
        (Some(name), _) if !name.is_empty() => name.to_string(),
        (_, Some(reference)) => names.assign(reference),
        _ => {
            return Err(DataSourceFileError::Invalid(format!(
                "{} needs a {} or {} attribute",
                DATA_SOURCE_DEFINITION, NAME, REFERENCE
            )))
        }
    };

    let required = |element: &str| {
        child_text(node, element).ok_or_else(|| {
            DataSourceFileError::Invalid(format!("data source {} has no {}", name, element))
        })
    };

    let credential_retrieval = required(CREDENTIAL_RETRIEVAL)?
        .parse::<CredentialRetrieval>()
        .map_err(DataSourceFileError::Invalid)?;

    let definition = DataSourceDefinition {
        extension: required(EXTENSION)?,
        connect_string: required(CONNECT_STRING)?,
        use_original_connect_string: flag(node, USE_ORIGINAL_CONNECT_STRING),
        original_connect_string_expression_based: flag(
            node,
            ORIGINAL_CONNECT_STRING_EXPRESSION_BASED,
        ),
        credential_retrieval,
        enabled: flag(node, ENABLED),
    };

    Ok(DataSource::definition(name, definition))
}

fn required_attribute(node: &roxmltree::Node, name: &str) -> Result<String, DataSourceFileError> {
    node.attribute(name).map(str::to_string).ok_or_else(|| {
        DataSourceFileError::Invalid(format!(
            "{} is missing attribute {}",
            node.tag_name().name(),
            name
        ))
    })
}

fn child_text(node: &roxmltree::Node, name: &str) -> Option<String> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .map(|c| c.text().unwrap_or("").to_string())
}

fn flag(node: &roxmltree::Node, name: &str) -> bool {
    child_text(node, name).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
