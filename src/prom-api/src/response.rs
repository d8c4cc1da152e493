use serde::Deserialize;
use tracing::warn;

use crate::Error;
use crate::model::QueryResult;

/// Envelope returned by `/api/v1/query` and `/api/v1/query_range`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(rename = "errorType", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: serde_json::Value,
}

impl ApiResponse {
    pub(crate) fn into_result(self) -> Result<QueryResult, Error> {
        for warning in &self.warnings {
            warn!("prometheus warning: {warning}");
        }

        if self.status == "error" {
            return Err(Error::api(
                self.error_type.unwrap_or_default(),
                self.error.unwrap_or_default(),
            ));
        }

        let data = self
            .data
            .ok_or_else(|| Error::Malformed("response has no data".to_string()))?;
        QueryResult::decode(&data.result_type, data.result)
    }
}

impl QueryResult {
    /// Decode a raw `result` according to its `resultType`.
    pub fn decode(result_type: &str, raw: serde_json::Value) -> Result<Self, Error> {
        let result = match result_type {
            "matrix" => QueryResult::Matrix(serde_json::from_value(raw)?),
            "vector" => QueryResult::Vector(serde_json::from_value(raw)?),
            "scalar" => QueryResult::Scalar(serde_json::from_value(raw)?),
            other => {
                return Err(Error::UnsupportedResultType {
                    result_type: other.to_string(),
                    raw,
                });
            }
        };
        Ok(result)
    }
}
