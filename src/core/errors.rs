use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluencyError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(Box<csv::Error>),

    #[error("Import file has no schema tag")]
    MissingSchema,

    #[error("Unsupported import schema: {0}")]
    UnsupportedSchema(String),

    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("FluencyError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for FluencyError {
    fn from(error: std::io::Error) -> Self {
        FluencyError::Io(Box::new(error))
    }
}

impl From<csv::Error> for FluencyError {
    fn from(error: csv::Error) -> Self {
        FluencyError::Csv(Box::new(error))
    }
}

impl FluencyError {
    /// Import failures are shown to the user; everything else is a system fault.
    pub fn is_import_error(&self) -> bool {
        matches!(
            self,
            FluencyError::MissingSchema
                | FluencyError::UnsupportedSchema(_)
                | FluencyError::InvalidImport(_)
        )
    }
}
