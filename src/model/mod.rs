//! Conversion inputs: data sources, canonical datasets and run-wide registries

mod data_set;
mod data_source;
mod registry;

pub use data_set::{
    parse_shared_data_set, read_shared_data_set_dir, read_shared_data_set_file,
    shared_data_set_stubs, CanonicalDataSets, DataSetKey,
};
pub use data_source::{
    read_data_source_file, CredentialRetrieval, DataSource, DataSourceDefinition,
    DataSourceItem, DataSourceReference,
};
pub use registry::{DataSourceNameCache, ReportNameRegistry};
