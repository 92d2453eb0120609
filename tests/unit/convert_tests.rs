//! Conversion engine tests against in-memory reports

use pretty_assertions::assert_eq;

use rust_rdlmigrate::catalog::{ReportCatalog, ReportSource};
use rust_rdlmigrate::convert::{
    convert_document, is_cloud_sql, resolve_subreport_path, ConversionInputs, ConversionState,
};
use rust_rdlmigrate::model::{
    CanonicalDataSets, CredentialRetrieval, DataSetKey, DataSource, DataSourceDefinition,
    DataSourceNameCache,
};
use rust_rdlmigrate::xml::{document_to_string, parse_document, parse_element, Document};
use rust_rdlmigrate::RdlMigrateError;

const NS: &str = "http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition";
const SHARED_NS: &str = "http://schemas.microsoft.com/sqlserver/reporting/2010/01/shareddatasetdefinition";
const OWNER: &str = "/Finance/Ledger";

/// Catalog with no reports in it.
struct EmptyCatalog;

impl ReportCatalog for EmptyCatalog {
    fn is_report(&self, _path: &str) -> bool {
        false
    }

    fn is_folder(&self, _path: &str) -> bool {
        false
    }

    fn reports_in_folder(&self, path: &str) -> Result<Vec<String>, RdlMigrateError> {
        Err(RdlMigrateError::ReportNotFound {
            path: path.to_string(),
        })
    }

    fn load_report(
        &self,
        path: &str,
        _names: &DataSourceNameCache,
    ) -> Result<ReportSource, RdlMigrateError> {
        Err(RdlMigrateError::ReportNotFound {
            path: path.to_string(),
        })
    }
}

fn ledger_report(data_sets: &str) -> Document {
    parse_document(&format!(
        r#"<Report xmlns="{NS}">
  <DataSources>
    <DataSource Name="Ledger"><DataSourceReference>/Data Sources/Ledger</DataSourceReference></DataSource>
  </DataSources>
  <DataSets>{data_sets}</DataSets>
  <Body><ReportItems><Subreport Name="s"><ReportName>../Shared/Footer</ReportName></Subreport></ReportItems></Body>
</Report>"#
    ))
    .unwrap()
}

fn stub(name: &str, reference: &str) -> String {
    format!(
        "<DataSet Name=\"{name}\"><SharedDataSet><SharedDataSetReference>{reference}</SharedDataSetReference></SharedDataSet></DataSet>"
    )
}

fn ledger_source(name: &str) -> DataSource {
    DataSource::definition(
        name,
        DataSourceDefinition {
            extension: "SQL".to_string(),
            connect_string: "Data Source=ledger01".to_string(),
            use_original_connect_string: false,
            original_connect_string_expression_based: false,
            credential_retrieval: CredentialRetrieval::Store,
            enabled: true,
        },
    )
}

fn canonical(filters: &str) -> rust_rdlmigrate::xml::Element {
    parse_element(&format!(
        r#"<DataSet xmlns="{SHARED_NS}" Name="Entries">
  <Query><DataSourceReference>/Data Sources/Ledger</DataSourceReference><CommandText>SELECT * FROM Entries</CommandText></Query>
  {filters}
</DataSet>"#
    ))
    .unwrap()
}

#[test]
fn test_cloud_sql_detection() {
    let cases = [
        ("Server=tcp:a.database.windows.net,1433;Database=x", true),
        ("Data Source=A.DATABASE.WINDOWS.NET", true),
        ("Address=\"b.database.usgovcloudapi.net\"", true),
        ("Data Source=np:c.database.chinacloudapi.cn\\inst", true),
        ("Data Source=sql01;Initial Catalog=x", false),
        ("Data Source=database.windows.net.example.com", false),
        ("Initial Catalog=x", false),
        ("", false),
    ];
    for (connect, expected) in cases {
        assert_eq!(is_cloud_sql(connect), expected, "{}", connect);
    }
}

#[test]
fn test_resolve_subreport_paths() {
    assert_eq!(resolve_subreport_path("/Finance", "Detail"), "/Finance/Detail");
    assert_eq!(resolve_subreport_path("/Finance", "../Shared/Footer"), "/Shared/Footer");
    assert_eq!(resolve_subreport_path("/Finance", "/Other/Report"), "/Other/Report");
    assert_eq!(resolve_subreport_path("/Finance", "sub\\Detail"), "/Finance/sub/Detail");
    assert_eq!(resolve_subreport_path("/", "../../Top"), "/Top");
    assert_eq!(
        resolve_subreport_path("/Finance", "http://server/reports/Detail"),
        "http://server/reports/Detail"
    );
    assert_eq!(resolve_subreport_path("/Finance", "Ledger:2024"), "/Finance/Ledger:2024");
}

#[test]
fn test_same_shared_data_set_under_two_names() {
    let mut document = ledger_report(&format!(
        "{}{}",
        stub("Current", "/Shared/Entries"),
        stub("Prior", "/Shared/Entries")
    ));
    let mut data_sets = CanonicalDataSets::new();
    let tree = std::sync::Arc::new(canonical(""));
    data_sets.insert_shared(DataSetKey::new(OWNER, "Current"), tree.clone());
    data_sets.insert_shared(DataSetKey::new(OWNER, "Prior"), tree);

    let state = ConversionState::new();
    let name = state.data_source_names.assign("/Data Sources/Ledger");
    let sources = vec![ledger_source(&name)];
    let inputs = ConversionInputs {
        owner_path: OWNER,
        data_sources: &sources,
        data_sets: &data_sets,
        root_folder: "/Finance",
    };

    let outcome = convert_document(&mut document, &inputs, &EmptyCatalog, &state).unwrap();
    assert_eq!(outcome.embedded_data_sets, 2);

    let xml = document_to_string(&document).unwrap();
    assert!(xml.contains(r#"<DataSet Name="Current">"#));
    assert!(xml.contains(r#"<DataSet Name="Prior">"#));
    assert_eq!(xml.matches("SELECT * FROM Entries").count(), 2);
    assert_eq!(state.data_source_names.len(), 1);
}

#[test]
fn test_failed_conversion_leaves_document_untouched() {
    let mut document = ledger_report(&stub("Current", "/Shared/Entries"));
    let before = document.clone();

    // Two Filters blocks on the canonical side is malformed
    let mut data_sets = CanonicalDataSets::new();
    data_sets.insert(
        DataSetKey::new(OWNER, "Current"),
        canonical("<Filters/><Filters/>"),
    );

    let sources = vec![ledger_source("Ledger")];
    let inputs = ConversionInputs {
        owner_path: OWNER,
        data_sources: &sources,
        data_sets: &data_sets,
        root_folder: "/Finance",
    };

    let err = convert_document(&mut document, &inputs, &EmptyCatalog, &ConversionState::new())
        .unwrap_err();
    assert!(matches!(
        err,
        RdlMigrateError::MalformedFilterStructure { count: 2, .. }
    ));
    assert_eq!(document, before);
}

#[test]
fn test_unresolved_data_source_is_error() {
    let mut document = ledger_report("");
    let sources = vec![DataSource::reference("Ledger", "/Data Sources/Ledger")];
    let data_sets = CanonicalDataSets::new();
    let inputs = ConversionInputs {
        owner_path: OWNER,
        data_sources: &sources,
        data_sets: &data_sets,
        root_folder: "/Finance",
    };

    let err = convert_document(&mut document, &inputs, &EmptyCatalog, &ConversionState::new())
        .unwrap_err();
    assert!(matches!(err, RdlMigrateError::UnresolvedDataSource { .. }));
}

#[test]
fn test_embedded_data_set_without_its_data_source_is_error() {
    let mut document = ledger_report(&stub("Current", "/Shared/Entries"));
    let before = document.clone();
    let mut data_sets = CanonicalDataSets::new();
    data_sets.insert(DataSetKey::new(OWNER, "Current"), canonical(""));

    // "Ledger" is embedded, but the dataset is pointed at the assigned name
    let sources = vec![ledger_source("Ledger")];
    let inputs = ConversionInputs {
        owner_path: OWNER,
        data_sources: &sources,
        data_sets: &data_sets,
        root_folder: "/Finance",
    };

    let err = convert_document(&mut document, &inputs, &EmptyCatalog, &ConversionState::new())
        .unwrap_err();
    match err {
        RdlMigrateError::UnresolvedDataSource { name, reference } => {
            assert_eq!(name, "DataSource0_Ledger");
            assert_eq!(reference, "/Data Sources/Ledger");
        }
        other => panic!("Expected UnresolvedDataSource, got {:?}", other),
    }
    assert_eq!(document, before);
}

#[test]
fn test_unresolvable_subreport_is_diagnostic_not_error() {
    let mut document = ledger_report("");
    let sources = vec![ledger_source("Ledger")];
    let data_sets = CanonicalDataSets::new();
    let inputs = ConversionInputs {
        owner_path: OWNER,
        data_sources: &sources,
        data_sets: &data_sets,
        root_folder: "/Finance",
    };

    let outcome =
        convert_document(&mut document, &inputs, &EmptyCatalog, &ConversionState::new()).unwrap();
    assert!(outcome.subreports.paths.is_empty());
    assert_eq!(outcome.subreports.diagnostics.len(), 1);
    assert!(outcome.subreports.diagnostics[0]
        .to_string()
        .contains("/Shared/Footer"));
}
