use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no columns to parse from input")]
    NoColumns,

    #[error("error tokenizing data: expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no parsing strategy configured")]
    NoStrategies,

    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,
}
