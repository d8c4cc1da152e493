use std::time::Duration;

use chrono::{DateTime, Utc};
use prom_api::{PrometheusClient, QueryResult, Range};
use tracing::debug;

use crate::ExportError;

/// Step used when a range query is requested without one.
pub const DEFAULT_STEP: Duration = Duration::from_secs(5 * 60);

/// Which endpoint to call and with what time parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryPlan {
    Instant { time: DateTime<Utc> },
    Range(Range),
}

impl QueryPlan {
    /// A positive `start` selects a range query ending at `end` (or `now`)
    /// with `step` (or [`DEFAULT_STEP`]); otherwise an instant query at `now`.
    pub fn resolve(
        start: i64,
        end: i64,
        step: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, ExportError> {
        if start <= 0 {
            return Ok(QueryPlan::Instant { time: now });
        }

        let start = unix_seconds(start, "start")?;
        let end = if end > 0 { unix_seconds(end, "end")? } else { now };
        let step = if step.is_zero() { DEFAULT_STEP } else { step };

        Ok(QueryPlan::Range(Range { start, end, step }))
    }
}

fn unix_seconds(seconds: i64, name: &str) -> Result<DateTime<Utc>, ExportError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| ExportError::InvalidRange(format!("{name} {seconds} is not a valid time")))
}

/// Issues exactly one query per call
pub struct QueryExecutor {
    client: PrometheusClient,
}

impl QueryExecutor {
    pub fn new(address: &str, timeout: Option<Duration>) -> Result<Self, ExportError> {
        Ok(Self {
            client: PrometheusClient::new(address, timeout)?,
        })
    }

    /// Resolve the plan against the current time and run it
    pub async fn execute(
        &self,
        query: &str,
        start: i64,
        end: i64,
        step: Duration,
    ) -> Result<QueryResult, ExportError> {
        let plan = QueryPlan::resolve(start, end, step, Utc::now())?;
        self.run(query, &plan).await
    }

    pub async fn run(&self, query: &str, plan: &QueryPlan) -> Result<QueryResult, ExportError> {
        debug!(base_url = self.client.base_url(), ?plan, query, "executing query");
        let result = match plan {
            QueryPlan::Instant { time } => self.client.query(query, *time).await?,
            QueryPlan::Range(range) => self.client.query_range(query, range).await?,
        };
        debug!(result_type = result.result_type(), "query succeeded");
        Ok(result)
    }
}
