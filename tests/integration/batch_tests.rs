//! Batch conversion tests: folders, subreports, conflicts and the log

use pretty_assertions::assert_eq;

use rust_rdlmigrate::batch::LogKind;

use crate::assert_no_shared_references;
use crate::common::TestContext;

#[test]
fn test_batch_follows_subreports() {
    let ctx = TestContext::with_fixture("report_server");

    let summary = ctx.run_batch("/Sales/Orders", false).unwrap();
    assert!(summary.is_success());
    assert_eq!(
        summary.converted,
        vec![ctx.output_file("Orders"), ctx.output_file("Detail")]
    );
    assert_eq!(summary.count(LogKind::Success), 2);
    assert_eq!(summary.count(LogKind::Subreport), 1);
    assert_eq!(summary.count(LogKind::SubreportFail), 1);

    assert!(ctx.output_file("Orders_original").exists());
    assert!(ctx.output_file("Detail_original").exists());
    assert_no_shared_references!(ctx.converted("Orders"));
}

#[test]
fn test_batch_writes_conversion_log() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.run_batch("/Sales/Orders", false).unwrap();

    let lines = ctx.log_lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("SUCCESS : Orders"));
    assert!(lines[1].starts_with("SUBREPORT FAIL : /Sales/Archive/OldOrders"));
    assert!(lines[2].starts_with("SUBREPORT : /Sales/Detail"));
    assert!(lines[3].starts_with("SUCCESS : Detail"));
}

#[test]
fn test_batch_existing_output_is_conflict() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.run_batch("/Sales/Orders", false).unwrap();

    let before = std::fs::read_to_string(ctx.output_file("Orders")).unwrap();
    let summary = ctx.run_batch("/Sales/Orders", false).unwrap();

    assert_eq!(summary.count(LogKind::Conflict), 1);
    assert_eq!(summary.count(LogKind::Success), 0);
    assert!(summary.converted.is_empty());
    assert!(summary.is_success(), "Conflicts are not failures");

    let after = std::fs::read_to_string(ctx.output_file("Orders")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_batch_overwrite_replaces_output() {
    let ctx = TestContext::with_fixture("report_server");
    ctx.run_batch("/Sales/Orders", false).unwrap();

    let summary = ctx.run_batch("/Sales/Orders", true).unwrap();
    assert_eq!(summary.count(LogKind::Conflict), 0);
    assert_eq!(summary.count(LogKind::Success), 2);
}

#[test]
fn test_batch_folder_claims_roots_before_subreports() {
    let ctx = TestContext::with_fixture("report_server");

    let summary = ctx.run_batch("/Sales", false).unwrap();

    // Detail is a root, so the subreport reference to it is a name conflict
    assert_eq!(summary.count(LogKind::Success), 2);
    assert_eq!(summary.count(LogKind::Subreport), 0);
    assert_eq!(summary.count(LogKind::Conflict), 1);
    assert!(ctx.output_file("Detail").exists());
    assert!(ctx.output_file("Orders").exists());
}

#[test]
fn test_batch_failure_leaves_no_converted_output() {
    let ctx = TestContext::with_fixture("report_server");

    let summary = ctx.run_batch("/Faulty", false).unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.count(LogKind::Failed), 1);

    assert!(!ctx.output_file("Unbound").exists());
    assert!(ctx.output_file("Unbound_original").exists());

    let lines = ctx.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("FAILED : Unbound"));
    assert!(lines[0].contains("/Datasets/DoesNotExist"));
}

#[test]
fn test_batch_file_uri_input_follows_relative_subreports() {
    let ctx = TestContext::with_fixture("report_server");
    let input = url::Url::from_file_path(ctx.report_file("/Sales/Orders")).unwrap();

    let summary = ctx.run_batch(input.as_str(), false).unwrap();
    assert!(summary.is_success());
    assert_eq!(
        summary.converted,
        vec![ctx.output_file("Orders"), ctx.output_file("Detail")]
    );
    assert_eq!(summary.count(LogKind::Subreport), 1);
    assert_eq!(summary.count(LogKind::SubreportFail), 1);
}

#[test]
fn test_batch_unknown_input() {
    let ctx = TestContext::with_fixture("report_server");

    let err = ctx.run_batch("/Nowhere/Report", false).unwrap_err();
    assert!(format!("{:#}", err).contains("/Nowhere/Report"));
}
