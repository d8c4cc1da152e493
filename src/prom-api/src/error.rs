/// Errors from talking to a Prometheus query API
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured address is not a URL
    #[error("invalid prometheus url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with an error, either in the response envelope or
    /// through an unexpected status code
    #[error("{error_type}: {message}")]
    Api { error_type: String, message: String },
    /// The response body could not be decoded
    #[error("bad_response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The response was well-formed JSON but lacked required fields
    #[error("bad_response: {0}")]
    Malformed(String),
    /// `resultType` is valid for the API but cannot be tabulated
    #[error("unknown/unimplemented type: {result_type}")]
    UnsupportedResultType {
        result_type: String,
        raw: serde_json::Value,
    },
}

impl Error {
    pub(crate) fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}
