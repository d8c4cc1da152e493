use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::config::Configuration;
use tracing::{debug, error};

use crate::error::{ExportError, describe};
use crate::executor::{QueryExecutor, QueryPlan};
use crate::render::{Delimiter, render};
use crate::table::flatten;
use crate::timestamp::{TimestampFormatter, Zone};

/// Configuration checked and converted into what a run needs
#[derive(Clone, Debug)]
pub struct Settings {
    pub url: String,
    pub query: String,
    pub start: i64,
    pub end: i64,
    pub step: Duration,
    pub timeout: Option<Duration>,
    pub delimiter: Delimiter,
    pub formatter: TimestampFormatter,
}

impl Settings {
    /// Checks run in this order: query, url, delimiter, date format.
    pub fn from_config(config: &Configuration) -> Result<Self, ExportError> {
        if config.query.is_empty() {
            return Err(ExportError::MissingQuery);
        }
        if config.url.is_empty() {
            return Err(ExportError::MissingUrl);
        }

        let delimiter = config.delim.parse()?;
        let zone = if config.utc { Zone::Utc } else { Zone::Local };
        let formatter = TimestampFormatter::new(&config.date_format, zone)?;

        Ok(Self {
            url: config.url.clone(),
            query: config.query.clone(),
            start: config.start,
            end: config.end,
            step: config.step,
            timeout: config.timeout,
            delimiter,
            formatter,
        })
    }

    pub fn plan(&self, now: DateTime<Utc>) -> Result<QueryPlan, ExportError> {
        QueryPlan::resolve(self.start, self.end, self.step, now)
    }
}

/// Validate everything that can be checked without contacting the server.
pub fn validate(config: &Configuration) -> Result<(), ExportError> {
    let settings = Settings::from_config(config)?;
    settings.plan(Utc::now())?;
    QueryExecutor::new(&settings.url, settings.timeout)?;
    Ok(())
}

/// Query, flatten and render; returns the delimited text.
pub async fn export(config: &Configuration) -> Result<String, ExportError> {
    let settings = Settings::from_config(config)?;
    let executor = QueryExecutor::new(&settings.url, settings.timeout)?;

    let result = executor
        .execute(&settings.query, settings.start, settings.end, settings.step)
        .await?;
    let table = flatten(&result, &settings.formatter);
    debug!(
        columns = table.header().len(),
        rows = table.data_rows().len(),
        "flattened {} result",
        result.result_type()
    );

    Ok(render(&table, settings.delimiter)?)
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Table printed
    Exported,
    /// An error was printed for the user
    Reported,
    /// Rendering failed; the process should exit unsuccessfully
    Aborted,
}

/// Run an export, writing the table or error messages to `out`/`err`.
pub async fn run<O: Write, E: Write>(
    config: &Configuration,
    out: &mut O,
    err: &mut E,
) -> io::Result<Outcome> {
    match export(config).await {
        Ok(text) => {
            writeln!(out, "{text}")?;
            Ok(Outcome::Exported)
        }
        Err(e) => report(&e, out, err),
    }
}

/// Print an export error the way the command line reports it.
///
/// Configuration errors go to `out`, query errors to `err`. An unsupported
/// result type additionally dumps the raw result to `out`.
pub fn report<O: Write, E: Write>(error: &ExportError, out: &mut O, err: &mut E) -> io::Result<Outcome> {
    match error {
        e if e.is_config() => {
            writeln!(out, "error: {e}")?;
            Ok(Outcome::Reported)
        }
        ExportError::Query(prom_api::Error::UnsupportedResultType { result_type, raw }) => {
            writeln!(err, "error: unknown/unimplemented type: {result_type}")?;
            writeln!(out, "Result:\n{raw:#}")?;
            Ok(Outcome::Reported)
        }
        ExportError::Query(e) => {
            writeln!(err, "error: {}", describe(e))?;
            Ok(Outcome::Reported)
        }
        e => {
            error!("aborting: {}", describe(e));
            writeln!(err, "error: {e}")?;
            Ok(Outcome::Aborted)
        }
    }
}
