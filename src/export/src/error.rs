use std::error::Error as StdError;

/// Everything that can end an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("missing query")]
    MissingQuery,

    #[error("missing prometheus url")]
    MissingUrl,

    #[error("invalid delimiter {0:?}: expected one ASCII character other than a quote or line break")]
    InvalidDelimiter(String),

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("invalid query range: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Query(#[from] prom_api::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ExportError {
    /// Problems detected before any request is made
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ExportError::MissingQuery
                | ExportError::MissingUrl
                | ExportError::InvalidDelimiter(_)
                | ExportError::InvalidDateFormat(_)
                | ExportError::InvalidRange(_)
                | ExportError::Query(prom_api::Error::InvalidUrl { .. })
        )
    }
}

/// Failure while serializing a table
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV flush failed: {0}")]
    Flush(#[from] std::io::Error),

    #[error("rendered CSV is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Message followed by any causes not already part of it.
pub fn describe(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
