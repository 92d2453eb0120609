//! Embedding resolved data sources into a report

use std::sync::LazyLock;

use regex::Regex;

use super::constants::{
    CLOUD_SQL_PROVIDER, CLOUD_SQL_SUFFIXES, CONNECTION_PROPERTIES, CONNECT_STRING, DATA_PROVIDER,
    DATA_SOURCE, DATA_SOURCES, DATA_SOURCE_REFERENCE, INTEGRATED_SECURITY, NAME, PROMPT,
    REPORT_DESIGNER_NS, SECURITY_TYPE, SQL_PROVIDER,
};
use crate::error::RdlMigrateError;
use crate::model::{CredentialRetrieval, DataSource, DataSourceDefinition, DataSourceItem};
use crate::util::{ends_with_ci, starts_with_ci};
use crate::xml::{Document, Element, QName};

/// Connection string keys that name the server.
static SERVER_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(data\s+source|server|address|addr|network\s+address)\s*$").unwrap()
});

const PROTOCOL_PREFIXES: &[&str] = &["tcp:", "np:", "lpc:"];

/// Prefix conventionally bound to the designer namespace.
const REPORT_DESIGNER_PREFIX: &str = "rd";

/// Replace shared data source references in `document` with embedded
/// definitions built from `data_sources`.
///
/// Reference-only entries are stripped first, but only when the report has
/// exactly one `DataSources` container. A source whose name is already
/// embedded is skipped.
pub fn embed_data_sources(
    document: &mut Document,
    data_sources: &[DataSource],
) -> Result<(), RdlMigrateError> {
    let mut definitions = Vec::with_capacity(data_sources.len());
    for source in data_sources {
        match &source.item {
            DataSourceItem::Definition(definition) => definitions.push((&source.name, definition)),
            DataSourceItem::Reference(reference) => {
                return Err(RdlMigrateError::UnresolvedDataSource {
                    name: source.name.clone(),
                    reference: reference.reference.clone(),
                })
            }
        }
    }

    let ns = document.namespace().map(str::to_string);
    let ns = ns.as_deref();
    let container_name = QName::new(ns, DATA_SOURCES);

    let containers = document.root.descendant_paths(&container_name);
    if containers.len() == 1 {
        if let Some(container) = document.root.at_path_mut(&containers[0]) {
            container.retain_elements(|child| !is_reference_only(child));
        }
    }

    if definitions.is_empty() {
        return Ok(());
    }
    ensure_designer_prefix(&mut document.root);

    if document.root.find_descendant(&container_name).is_none() {
        document.root.push(Element::new(container_name.clone()));
    }
    let Some(container) = document.root.find_descendant_mut(&container_name) else {
        return Ok(());
    };

    for (name, definition) in definitions {
        let exists = container
            .elements()
            .any(|el| el.attribute(NAME) == Some(name.as_str()));
        if exists {
            log::debug!("Data source {} already embedded", name);
            continue;
        }
        log::info!("Embedding data source {}", name);
        container.push(build_data_source(ns, name, definition));
    }

    Ok(())
}

fn is_reference_only(data_source: &Element) -> bool {
    let reference = QName::new(data_source.name.namespace(), DATA_SOURCE_REFERENCE);
    data_source.child(&reference).is_some()
}

fn ensure_designer_prefix(root: &mut Element) {
    let bound = root.namespaces.iter().any(|d| d.uri == REPORT_DESIGNER_NS);
    if !bound {
        root.declare_namespace(Some(REPORT_DESIGNER_PREFIX), REPORT_DESIGNER_NS);
    }
}

/// Build the embedded `DataSource` element for one definition.
pub fn build_data_source(ns: Option<&str>, name: &str, definition: &DataSourceDefinition) -> Element {
    let el = |local: &str, text: &str| Element::with_text(QName::new(ns, local), text);
    let designer = |local: &str, text: &str| {
        Element::with_text(QName::new(Some(REPORT_DESIGNER_NS), local), text)
    };

    let provider = if definition.extension == SQL_PROVIDER && is_cloud_sql(&definition.connect_string)
    {
        CLOUD_SQL_PROVIDER
    } else {
        definition.extension.as_str()
    };

    let mut properties = Element::new(QName::new(ns, CONNECTION_PROPERTIES));
    properties.push(el(DATA_PROVIDER, provider));
    properties.push(el(CONNECT_STRING, &definition.connect_string));

    let security_type = match definition.credential_retrieval {
        CredentialRetrieval::Integrated => {
            properties.push(el(INTEGRATED_SECURITY, "true"));
            "Integrated"
        }
        CredentialRetrieval::Store => "DataBase",
        CredentialRetrieval::Prompt => {
            let prompt = format!("Specify a user name and password for data source {}", name);
            properties.push(el(PROMPT, &prompt));
            "DataBase"
        }
        CredentialRetrieval::None => "None",
    };

    let mut data_source = Element::new(QName::new(ns, DATA_SOURCE));
    data_source.set_attribute(NAME, name);
    data_source.push(properties);
    data_source.push(designer(SECURITY_TYPE, security_type));
    data_source
}

/// Whether the connection string's server is a cloud SQL database host.
pub fn is_cloud_sql(connect_string: &str) -> bool {
    server_host(connect_string).is_some_and(|host| {
        CLOUD_SQL_SUFFIXES
            .iter()
            .any(|suffix| ends_with_ci(&host, suffix))
    })
}

/// Host part of the server named in a connection string, with protocol
/// prefix, port and instance name removed. The last server key wins.
fn server_host(connect_string: &str) -> Option<String> {
    let server = connect_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| SERVER_KEY_RE.is_match(key))
        .map(|(_, value)| value.trim().trim_matches(['"', '\'']))
        .last()?;

    let mut host = server;
    if let Some(prefix) = PROTOCOL_PREFIXES
        .iter()
        .find(|prefix| starts_with_ci(host, prefix))
    {
        host = &host[prefix.len()..];
    }
    let host = host
        .split([',', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    (!host.is_empty()).then(|| host.to_string())
}
