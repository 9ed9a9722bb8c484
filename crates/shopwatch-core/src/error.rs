use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read site catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV site catalog {path}: {source}")]
    CatalogCsv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse YAML site catalog {path}: {source}")]
    CatalogYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported site catalog format for {path} (expected .csv, .yaml or .yml)")]
    UnsupportedCatalogFormat { path: String },
}
