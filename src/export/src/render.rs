use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{ExportError, RenderError};
use crate::table::Table;

/// Single-byte field separator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiter(u8);

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter(b';')
    }
}

impl FromStr for Delimiter {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii() && !matches!(ch, '"' | '\r' | '\n') => {
                Ok(Delimiter(ch as u8))
            }
            _ => Err(ExportError::InvalidDelimiter(s.to_string())),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

/// Write `table` as delimited text, one `\n`-terminated line per row.
///
/// Cells containing the delimiter, a quote or a line break are quoted with
/// inner quotes doubled. Rows shorter than the header are written as-is.
pub fn write_table<W: Write>(table: &Table, delimiter: Delimiter, writer: W) -> Result<W, RenderError> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for row in table.rows() {
        csv.write_record(row)?;
    }

    csv.into_inner().map_err(|e| RenderError::Flush(e.into_error()))
}

pub fn render(table: &Table, delimiter: Delimiter) -> Result<String, RenderError> {
    let bytes = write_table(table, delimiter, Vec::new())?;
    Ok(String::from_utf8(bytes)?)
}
