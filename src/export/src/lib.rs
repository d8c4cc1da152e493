//! Turn a Prometheus query result into delimited text.

mod error;
pub mod executor;
pub mod render;
pub mod runner;
pub mod table;
pub mod timestamp;

pub use error::{ExportError, RenderError, describe};
pub use executor::{DEFAULT_STEP, QueryExecutor, QueryPlan};
pub use render::{Delimiter, render};
pub use runner::{Outcome, Settings, export, report, run, validate};
pub use table::{Table, flatten};
pub use timestamp::{TimestampFormatter, Zone};
