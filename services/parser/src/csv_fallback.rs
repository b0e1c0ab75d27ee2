//! CSV parsing with an ordered list of fallback strategies.
//!
//! Upstream files carry no schema guarantee, so instead of failing on the
//! first malformed line we try progressively more permissive configurations
//! and keep the first one that parses. A lenient strategy may silently drop
//! rows; that is accepted.

use std::borrow::Cow;

use csv::ReaderBuilder;
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::error::ParseError;
use crate::table::{Cell, Table};

/// One parsing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvStrategy {
    pub name: &'static str,
    pub delimiter: u8,
    /// Skip malformed lines instead of failing the whole parse.
    pub lenient: bool,
}

/// Tried in this order; the first success wins.
pub const STRATEGIES: [CsvStrategy; 4] = [
    CsvStrategy {
        name: "default",
        delimiter: b',',
        lenient: false,
    },
    CsvStrategy {
        name: "lenient",
        delimiter: b',',
        lenient: true,
    },
    CsvStrategy {
        name: "lenient-semicolon",
        delimiter: b';',
        lenient: true,
    },
    CsvStrategy {
        name: "lenient-tab",
        delimiter: b'\t',
        lenient: true,
    },
];

/// Run `attempts` in order and return the first `Ok`. When every attempt
/// fails, the last error is returned. `None` only if there were no attempts.
pub fn first_success<T, E, F>(attempts: impl IntoIterator<Item = F>) -> Option<Result<T, E>>
where
    F: FnOnce() -> Result<T, E>,
{
    let mut last = None;
    for attempt in attempts {
        match attempt() {
            Ok(value) => return Some(Ok(value)),
            Err(e) => last = Some(Err(e)),
        }
    }
    last
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to Windows-1252 when
/// the input is not valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }
    debug!("input is not valid UTF-8, decoding as windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text
}

/// Parse CSV bytes with the default strategy list.
pub fn parse_csv(bytes: &[u8]) -> Result<Table, ParseError> {
    let text = decode_text(bytes);
    parse_with_strategies(&text, &STRATEGIES)
}

pub fn parse_with_strategies(text: &str, strategies: &[CsvStrategy]) -> Result<Table, ParseError> {
    first_success(strategies.iter().map(|strategy| {
        move || {
            let result = parse_with(text, strategy);
            match &result {
                Ok(table) => debug!(
                    strategy = strategy.name,
                    rows = table.row_count(),
                    columns = table.column_count(),
                    "CSV parsed"
                ),
                Err(e) => debug!(strategy = strategy.name, error = %e, "CSV strategy failed"),
            }
            result
        }
    }))
    .unwrap_or(Err(ParseError::NoStrategies))
}

/// Parse `text` with a single strategy.
pub fn parse_with(text: &str, strategy: &CsvStrategy) -> Result<Table, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(strategy.delimiter)
        .has_headers(true)
        // Row width is checked below so short rows can be padded.
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(ParseError::NoColumns);
    }

    let width = headers.len();
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) if strategy.lenient => {
                debug!(strategy = strategy.name, error = %e, "skipping unreadable line");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if record.len() > width {
            if strategy.lenient {
                skipped += 1;
                continue;
            }
            return Err(ParseError::TooManyFields {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            });
        }

        rows.push(record.iter().map(Cell::from_text).collect());
    }

    if skipped > 0 {
        debug!(strategy = strategy.name, skipped, "dropped malformed lines");
    }

    Ok(Table::new(headers, rows))
}
