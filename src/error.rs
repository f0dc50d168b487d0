// error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RollerError>;

#[derive(Debug, Error)]
pub enum RollerError {
    /// The sheet has the column but nothing usable in it for the current path.
    #[error("flawed table: {0}")]
    MalformedSource(String),

    #[error("nothing to roll in column '{column}' for this selection")]
    EmptyPool { column: String },

    #[error("column '{0}' is not in the table")]
    UnknownColumn(String),

    #[error("description column '{0}' is not in the table")]
    MissingDescription(String),

    #[error("no column header matches the category pattern")]
    NoCategories,

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid category pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] rustyline::error::ReadlineError),

    #[error("input closed")]
    InputClosed,
}

impl RollerError {
    /// Errors the session reports and then carries on from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RollerError::MalformedSource(_) | RollerError::EmptyPool { .. }
        )
    }
}
