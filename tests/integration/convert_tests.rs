//! Single report conversion tests

use std::fs;

use pretty_assertions::assert_eq;

use crate::common::{ReportInfo, TestContext};
use crate::{assert_no_shared_references, assert_report_has_data_source};

#[test]
fn test_convert_embeds_data_sources_and_data_sets() {
    let ctx = TestContext::with_fixture("report_server");

    let summary = ctx.convert("/Sales/Orders").expect("Conversion should succeed");
    assert_eq!(summary.output_path, ctx.output_file("Orders"));
    assert_eq!(summary.outcome.embedded_data_sets, 1);

    let info = ctx.converted("Orders");
    assert_no_shared_references!(info);
    assert_report_has_data_source!(info, "SalesDb");
    assert_report_has_data_source!(info, "DataSource0_Warehouse");

    // The shared dataset's query now points at the embedded shared source
    assert_eq!(info.query_data_sources, vec!["DataSource0_Warehouse"]);
    assert!(info.content.contains("FROM dbo.Orders"));
}

#[test]
fn test_convert_reconciles_parameters_fields_and_filters() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.convert("/Sales/Orders").unwrap();

    let info = ctx.converted("Orders");

    // Region is set by the report; Year comes from the shared default
    assert_eq!(info.query_parameters, vec!["Region", "Year"]);
    assert!(info.content.contains("=Parameters!Region.Value"));
    assert!(info.content.contains("<Value>2024</Value>"));
    assert_eq!(info.count("DataSetParameters"), 0);

    // Report fields stay first; the shared-only field is appended
    assert_eq!(info.fields, vec!["OrderId", "Total", "Region"]);

    assert_eq!(info.count("Filter"), 1);
    assert_eq!(info.text_of("Operator").as_deref(), Some("GreaterThan"));
}

#[test]
fn test_convert_keeps_report_namespace() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.convert("/Sales/Orders").unwrap();

    let info = ctx.converted("Orders");
    assert!(
        !info.content.contains("shareddatasetdefinition"),
        "Shared dataset namespace leaked into the report"
    );

    let doc = roxmltree::Document::parse(&info.content).unwrap();
    let query = doc
        .descendants()
        .find(|n| n.has_tag_name("Query"))
        .expect("Embedded query");
    assert_eq!(
        query.tag_name().namespace(),
        Some("http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition")
    );
}

#[test]
fn test_convert_tags_origin_once() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.convert("/Sales/Orders").unwrap();

    // Convert the converted report again in place of the original
    let converted = fs::read_to_string(ctx.output_file("Orders")).unwrap();
    fs::write(ctx.report_file("/Sales/Orders"), converted).unwrap();
    ctx.convert("/Sales/Orders").unwrap();

    let info = ctx.converted("Orders");
    assert_eq!(info.count("AuthoringMetadata"), 1);
    assert_eq!(info.count("CreatedBy"), 1);
    assert_eq!(info.count("UpdatedBy"), 1);
    assert_eq!(info.count("DataSource"), 2, "Data sources must not be embedded twice");
}

#[test]
fn test_convert_upgrades_cloud_provider() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.convert("/Cloud/Inventory").unwrap();

    let info = ctx.converted("Inventory");
    assert_report_has_data_source!(info, "Inventory");
    assert_eq!(info.text_of("DataProvider").as_deref(), Some("SQLAzure"));
    assert_eq!(info.text_of("SecurityType").as_deref(), Some("DataBase"));
    assert!(info.text_of("Prompt").is_some());
}

#[test]
fn test_convert_missing_shared_dataset_writes_nothing() {
    let ctx = TestContext::with_fixture("report_server");

    let err = ctx
        .convert("/Faulty/Unbound")
        .expect_err("Unbound shared dataset should fail");
    let message = format!("{:#}", err);
    assert!(
        message.contains("DoesNotExist"),
        "Error should name the missing shared dataset: {}",
        message
    );
    assert!(!ctx.output_file("Unbound").exists());
}

#[test]
fn test_convert_without_shared_data_source_entry_writes_nothing() {
    let ctx = TestContext::with_fixture("report_server");

    // Keep only the report's own data source; the shared one the dataset needs is gone
    let rds = ctx.report_file("/Sales/Orders").with_extension("rds");
    let content = fs::read_to_string(&rds).unwrap();
    let start = content.find(r#"<DataSourceDefinition Reference="#).unwrap();
    let end = content[start..].find("</DataSourceDefinition>").unwrap()
        + start
        + "</DataSourceDefinition>".len();
    fs::write(&rds, format!("{}{}", &content[..start], &content[end..])).unwrap();

    let err = ctx
        .convert("/Sales/Orders")
        .expect_err("Dataset pointing at a missing data source should fail");
    let message = format!("{:#}", err);
    assert!(
        message.contains("/Data Sources/Warehouse"),
        "Error should name the shared data source: {}",
        message
    );
    assert!(!ctx.output_file("Orders").exists());
}

#[test]
fn test_convert_reports_missing_subreports() {
    let ctx = TestContext::with_fixture("report_server");

    let summary = ctx.convert("/Sales/Orders").unwrap();
    let subreports = &summary.outcome.subreports;
    assert_eq!(subreports.paths, vec!["/Sales/Detail"]);
    assert_eq!(subreports.diagnostics.len(), 1);
    assert!(subreports.diagnostics[0]
        .to_string()
        .contains("/Sales/Archive/OldOrders"));
}

#[test]
fn test_converted_report_parses_back() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.convert("/Sales/Orders").unwrap();

    let content = fs::read_to_string(ctx.output_file("Orders")).unwrap();
    assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));

    let document = rust_rdlmigrate::xml::parse_document(&content).unwrap();
    let rewritten = rust_rdlmigrate::xml::document_to_string(&document).unwrap();
    let info = ReportInfo::from_xml(rewritten).unwrap();
    assert_eq!(info.fields, vec!["OrderId", "Total", "Region"]);
    assert_eq!(info.data_sources, vec!["SalesDb", "DataSource0_Warehouse"]);
}
