use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FilterError {
    #[error("config file not found: {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse YAML config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    #[diagnostic(help(
        "set one of `country` or `geometry`, and at least one of `name_column` or `taxid_column`"
    ))]
    InvalidConfig(String),

    #[error("column `{0}` not found in input table")]
    MissingColumn(String),

    #[error("invalid taxon id: {0}")]
    InvalidTaxonId(String),

    #[error("occurrence provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("occurrence provider returned status {status}: {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("unexpected occurrence provider response: {0}")]
    ProviderResponse(String),

    #[error("failed to read input table: {0}")]
    TableRead(String),

    #[error("failed to write output table: {0}")]
    TableWrite(String),
}

impl FilterError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FilterError::MissingConfig(_)
                | FilterError::ConfigRead(_)
                | FilterError::ConfigParse(_)
                | FilterError::InvalidConfig(_)
                | FilterError::MissingColumn(_)
        )
    }

    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            FilterError::ProviderUnavailable(_)
                | FilterError::ProviderStatus { .. }
                | FilterError::ProviderResponse(_)
        )
    }
}
