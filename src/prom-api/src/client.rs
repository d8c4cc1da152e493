use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::Error;
use crate::model::{QueryResult, Timestamp};
use crate::response::ApiResponse;

/// Time range and resolution of a range query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

/// HTTP client for the Prometheus query API
pub struct PrometheusClient {
    base_url: String,
    http: reqwest::Client,
}

impl PrometheusClient {
    /// Create a client for the server at `address`, e.g. `http://localhost:9090/`.
    ///
    /// A path in the address is kept as a prefix for the API endpoints.
    pub fn new(address: &str, timeout: Option<Duration>) -> Result<Self, Error> {
        let url = Url::parse(address).map_err(|source| Error::InvalidUrl {
            url: address.to_string(),
            source,
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Evaluate `query` at a single instant
    pub async fn query(&self, query: &str, time: DateTime<Utc>) -> Result<QueryResult, Error> {
        let params = [
            ("query", query.to_string()),
            ("time", format_time(time)),
        ];
        self.get("/api/v1/query", &params).await
    }

    /// Evaluate `query` over `range`
    pub async fn query_range(&self, query: &str, range: &Range) -> Result<QueryResult, Error> {
        let params = [
            ("query", query.to_string()),
            ("start", format_time(range.start)),
            ("end", format_time(range.end)),
            ("step", range.step.as_secs_f64().to_string()),
        ];
        self.get("/api/v1/query_range", &params).await
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<QueryResult, Error> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(%url, ?params, "issuing query");

        let resp = self.http.get(&url).query(params).send().await?;
        handle_response(resp).await
    }
}

/// 400, 422 and 503 carry an error envelope; other non-2xx codes do not.
fn carries_envelope(status: reqwest::StatusCode) -> bool {
    status.is_success() || matches!(status.as_u16(), 400 | 422 | 503)
}

async fn handle_response(resp: reqwest::Response) -> Result<QueryResult, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !carries_envelope(status) {
        let code = status.as_u16();
        return Err(if status.is_server_error() {
            Error::api("server_error", format!("server error: {code}"))
        } else {
            Error::api("client_error", format!("client error: {code}"))
        });
    }

    let envelope: ApiResponse = serde_json::from_str(&body)?;
    envelope.into_result()
}

fn format_time(time: DateTime<Utc>) -> String {
    Timestamp::from(time).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[test]
    fn rejects_invalid_address() {
        let err = PrometheusClient::new("not a url", None).err().unwrap();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn keeps_path_prefix() {
        let client = PrometheusClient::new("http://prom.example:9090/prefix/", None).unwrap();
        assert_eq!(client.base_url(), "http://prom.example:9090/prefix");
    }

    #[test]
    fn formats_times_as_seconds() {
        let time = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        assert_eq!(format_time(time), "1700000000.25");
    }

    #[tokio::test]
    async fn instant_query_sends_query_and_time() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("query").map(String::as_str), Some("up"));
                assert_eq!(params.get("time").map(String::as_str), Some("1700000000"));
                r#"{"status":"success","data":{"resultType":"scalar","result":[1700000000,"1"]}}"#
            }),
        );
        let client = PrometheusClient::new(&serve(app).await, None).unwrap();

        let time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let result = client.query("up", time).await.unwrap();
        assert_eq!(result.result_type(), "scalar");
    }

    #[tokio::test]
    async fn range_query_sends_step_in_seconds() {
        let app = Router::new().route(
            "/api/v1/query_range",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("start").map(String::as_str), Some("100"));
                assert_eq!(params.get("end").map(String::as_str), Some("200"));
                assert_eq!(params.get("step").map(String::as_str), Some("30"));
                r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#
            }),
        );
        let client = PrometheusClient::new(&serve(app).await, None).unwrap();

        let range = Range {
            start: DateTime::from_timestamp(100, 0).unwrap(),
            end: DateTime::from_timestamp(200, 0).unwrap(),
            step: Duration::from_secs(30),
        };
        let result = client.query_range("up", &range).await.unwrap();
        assert_eq!(result, QueryResult::Matrix(vec![]));
    }

    #[tokio::test]
    async fn bad_request_envelope_is_surfaced() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    r#"{"status":"error","errorType":"bad_data","error":"invalid parameter \"query\""}"#,
                )
            }),
        );
        let client = PrometheusClient::new(&serve(app).await, None).unwrap();

        let err = client.query("up{", Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), r#"bad_data: invalid parameter "query""#);
    }

    #[tokio::test]
    async fn internal_server_error_without_envelope() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = PrometheusClient::new(&serve(app).await, None).unwrap();

        let err = client.query("up", Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), "server_error: server error: 500");
    }

    #[tokio::test]
    async fn not_found_is_a_client_error() {
        let client = PrometheusClient::new(&serve(Router::new()).await, None).unwrap();

        let err = client.query("up", Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), "client_error: client error: 404");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PrometheusClient::new(&format!("http://{addr}/"), None).unwrap();
        let err = client.query("up", Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got {err:?}");
    }
}
