//! Common test utilities for rust-rdlmigrate tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rust_rdlmigrate::{BatchOptions, BatchSummary, ConvertOptions, ConvertSummary};

/// Test context that manages a temporary copy of a report server fixture
pub struct TestContext {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub output_dir: PathBuf,
    _fixture_name: String,
}

impl TestContext {
    /// Create a new test context by copying a fixture into a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(fixture_name);

        let root = temp_dir.path().join("server");
        copy_dir_recursive(&fixture_path, &root).expect("Failed to copy fixture");
        let output_dir = temp_dir.path().join("output");

        Self {
            _temp_dir: temp_dir,
            root,
            output_dir,
            _fixture_name: fixture_name.to_string(),
        }
    }

    /// Local file for a server path such as `/Sales/Orders`
    pub fn report_file(&self, server_path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in server_path.split('/').filter(|s| !s.is_empty()) {
            file.push(segment);
        }
        file.set_extension("rdl");
        file
    }

    /// Run a batch conversion of `input` into this context's output folder
    pub fn run_batch(&self, input: &str, overwrite: bool) -> anyhow::Result<BatchSummary> {
        rust_rdlmigrate::run_batch(BatchOptions {
            root: self.root.clone(),
            input: input.to_string(),
            output_dir: Some(self.output_dir.clone()),
            overwrite,
            origin_tag: true,
            schema: None,
        })
    }

    /// Convert one report file with its sidecar data sources and datasets
    pub fn convert(&self, server_path: &str) -> anyhow::Result<ConvertSummary> {
        rust_rdlmigrate::convert_report(ConvertOptions {
            report_path: self.report_file(server_path),
            data_sources: None,
            data_sets: None,
            output_dir: Some(self.output_dir.clone()),
            owner: Some(server_path.to_string()),
            origin_tag: true,
            schema: None,
        })
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.rdl", name))
    }

    /// Read a converted report from the output folder
    pub fn converted(&self, name: &str) -> ReportInfo {
        ReportInfo::from_file(&self.output_file(name)).expect("Failed to read converted report")
    }

    /// Lines of the conversion log
    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.output_dir.join("ConversionLog.txt"))
            .expect("Failed to read conversion log")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Facts pulled out of a converted report for assertions
#[derive(Debug, Default)]
pub struct ReportInfo {
    pub content: String,
    /// `Name` of every embedded `DataSource`
    pub data_sources: Vec<String>,
    /// `DataSourceName` text of every dataset query
    pub query_data_sources: Vec<String>,
    /// `Name` of every `QueryParameter`, in document order
    pub query_parameters: Vec<String>,
    /// `Name` of every `Field`, in document order
    pub fields: Vec<String>,
}

impl ReportInfo {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_xml(content)
    }

    pub fn from_xml(content: String) -> Result<Self, String> {
        let mut info = ReportInfo::default();
        {
            let doc = roxmltree::Document::parse(&content)
                .map_err(|e| format!("Converted report is not XML: {}", e))?;

            for node in doc.descendants().filter(|n| n.is_element()) {
                let name = node.attribute("Name").unwrap_or_default().to_string();
                match node.tag_name().name() {
                    "DataSource" => info.data_sources.push(name),
                    "QueryParameter" => info.query_parameters.push(name),
                    "Field" => info.fields.push(name),
                    "DataSourceName" => info
                        .query_data_sources
                        .push(node.text().unwrap_or_default().to_string()),
                    _ => {}
                }
            }
        }
        info.content = content;
        Ok(info)
    }

    /// Number of elements with this local name
    pub fn count(&self, local_name: &str) -> usize {
        roxmltree::Document::parse(&self.content)
            .map(|doc| {
                doc.descendants()
                    .filter(|n| n.is_element() && n.tag_name().name() == local_name)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Text of the first element with this local name
    pub fn text_of(&self, local_name: &str) -> Option<String> {
        let doc = roxmltree::Document::parse(&self.content).ok()?;
        let text = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == local_name)?
            .text()
            .unwrap_or_default()
            .to_string();
        Some(text)
    }
}

/// Recursively copy a directory
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Assert that a converted report embeds a data source
#[macro_export]
macro_rules! assert_report_has_data_source {
    ($info:expr, $name:expr) => {
        assert!(
            $info.data_sources.iter().any(|d| d == $name),
            "Expected converted report to embed data source '{}', found: {:?}",
            $name,
            $info.data_sources
        );
    };
}

/// Assert that no shared dataset stub survived conversion
#[macro_export]
macro_rules! assert_no_shared_references {
    ($info:expr) => {
        assert_eq!(
            $info.count("SharedDataSet"),
            0,
            "Expected no SharedDataSet stubs in converted report"
        );
        assert_eq!(
            $info.count("DataSourceReference"),
            0,
            "Expected no DataSourceReference elements in converted report"
        );
    };
}
