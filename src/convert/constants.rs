//! Report definition element names and namespaces.

/// Designer extension namespace (`rd:` prefix in reports)
pub const REPORT_DESIGNER_NS: &str = "http://schemas.microsoft.com/SQLServer/reporting/reportdesigner";

/// Shared dataset definition namespace (`.rsd` files)
pub const SHARED_DATASET_NS: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2010/01/shareddatasetdefinition";

/// Authoring metadata namespace (`am:` prefix)
pub const AUTHORING_METADATA_NS: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/authoringmetadata";

/// Host suffixes of cloud-hosted SQL databases
pub const CLOUD_SQL_SUFFIXES: &[&str] = &[
    ".database.windows.net",
    ".database.chinacloudapi.cn",
    ".database.cloudapi.de",
    ".database.usgovcloudapi.net",
];

pub const REPORT_FILE_EXTENSION: &str = "rdl";
pub const DATA_SOURCE_FILE_EXTENSION: &str = "rds";
pub const DATA_SET_FILE_EXTENSION: &str = "rsd";

pub const NAME: &str = "Name";
pub const VALUE: &str = "Value";

// Data sources
pub const DATA_SOURCES: &str = "DataSources";
pub const DATA_SOURCE: &str = "DataSource";
pub const DATA_SOURCE_REFERENCE: &str = "DataSourceReference";
pub const DATA_SOURCE_DEFINITION: &str = "DataSourceDefinition";
pub const CONNECTION_PROPERTIES: &str = "ConnectionProperties";
pub const DATA_PROVIDER: &str = "DataProvider";
pub const CONNECT_STRING: &str = "ConnectString";
pub const INTEGRATED_SECURITY: &str = "IntegratedSecurity";
pub const PROMPT: &str = "Prompt";
pub const SECURITY_TYPE: &str = "SecurityType";
pub const EXTENSION: &str = "Extension";
pub const USE_ORIGINAL_CONNECT_STRING: &str = "UseOriginalConnectString";
pub const ORIGINAL_CONNECT_STRING_EXPRESSION_BASED: &str = "OriginalConnectStringExpressionBased";
pub const CREDENTIAL_RETRIEVAL: &str = "CredentialRetrieval";
pub const ENABLED: &str = "Enabled";
pub const REFERENCE: &str = "Reference";
pub const SQL_PROVIDER: &str = "SQL";
pub const CLOUD_SQL_PROVIDER: &str = "SQLAzure";

// Data sets
pub const DATA_SETS: &str = "DataSets";
pub const DATA_SET: &str = "DataSet";
pub const SHARED_DATA_SET: &str = "SharedDataSet";
pub const SHARED_DATA_SET_REFERENCE: &str = "SharedDataSetReference";
pub const QUERY: &str = "Query";
pub const DATA_SOURCE_NAME: &str = "DataSourceName";
pub const DATA_SET_PARAMETERS: &str = "DataSetParameters";
pub const DEFAULT_VALUE: &str = "DefaultValue";
pub const QUERY_DEFINITION: &str = "QueryDefinition";
pub const QUERY_PARAMETERS: &str = "QueryParameters";
pub const QUERY_PARAMETER: &str = "QueryParameter";
pub const FIELDS: &str = "Fields";
pub const DATA_FIELD: &str = "DataField";
pub const FILTERS: &str = "Filters";

// Subreports
pub const SUBREPORT: &str = "Subreport";
pub const REPORT_NAME: &str = "ReportName";
