use std::collections::BTreeMap;

use prom_api::{QueryResult, Sample, Scalar, Series, Timestamp};

use crate::timestamp::TimestampFormatter;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const METRIC_COLUMN: &str = "metric";
pub const VALUE_COLUMN: &str = "value";

pub type Row = Vec<String>;

/// Header row followed by data rows. Rows may be shorter than the header;
/// missing trailing cells are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn with_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: vec![header.into_iter().map(Into::into).collect()],
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// All rows, header first
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cell at `column`, treating absent trailing cells as empty
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        let row = self.rows.get(row)?;
        Some(row.get(column).map(String::as_str).unwrap_or(""))
    }
}

/// Reshape a query result into a table.
pub fn flatten(result: &QueryResult, formatter: &TimestampFormatter) -> Table {
    match result {
        QueryResult::Matrix(series) => flatten_matrix(series, formatter),
        QueryResult::Vector(samples) => flatten_vector(samples, formatter),
        QueryResult::Scalar(scalar) => flatten_scalar(scalar, formatter),
    }
}

/// One column per series in input order, one row per distinct timestamp in
/// ascending order.
fn flatten_matrix(series: &[Series], formatter: &TimestampFormatter) -> Table {
    let mut header = Vec::with_capacity(series.len() + 1);
    header.push(TIMESTAMP_COLUMN.to_string());

    let mut rows: BTreeMap<Timestamp, Row> = BTreeMap::new();
    for (column, stream) in series.iter().enumerate() {
        header.push(stream.metric.to_string());

        for sample in &stream.values {
            let row = rows.entry(sample.timestamp).or_default();
            // Only this series can have filled past `column`: a repeated
            // timestamp replaces its earlier value.
            row.truncate(column);
            row.resize(column, String::new());
            row.push(sample.value.to_string());
        }
    }

    let mut table = Table::with_header(header);
    for (timestamp, values) in rows {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(formatter.format(timestamp));
        row.extend(values);
        table.push_row(row);
    }
    table
}

fn flatten_vector(samples: &[Sample], formatter: &TimestampFormatter) -> Table {
    let mut table = Table::with_header([TIMESTAMP_COLUMN, METRIC_COLUMN, VALUE_COLUMN]);
    for sample in samples {
        table.push_row(vec![
            formatter.format(sample.timestamp),
            sample.metric.to_string(),
            sample.value.to_string(),
        ]);
    }
    table
}

fn flatten_scalar(scalar: &Scalar, formatter: &TimestampFormatter) -> Table {
    let mut table = Table::with_header([TIMESTAMP_COLUMN, VALUE_COLUMN]);
    table.push_row(vec![
        formatter.format(scalar.timestamp),
        scalar.value.to_string(),
    ]);
    table
}
