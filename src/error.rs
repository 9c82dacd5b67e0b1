use thiserror::Error;

/// Failures talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} error: {message}")]
    Transport { kind: &'static str, message: String },

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The period query failed; the previously displayed state is kept.
    #[error("attendance fetch failed: {0}")]
    FetchFailure(#[source] StoreError),

    /// The presence write failed.
    #[error("attendance update failed: {0}")]
    MutationFailure(#[source] StoreError),

    #[error("no group is open")]
    NoGroup,

    #[error("{0}")]
    UnknownPeriod(String),

    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
}

impl TrackerError {
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::FetchFailure(_) => "fetch_failed",
            TrackerError::MutationFailure(_) => "mutation_failed",
            TrackerError::NoGroup => "no_group",
            TrackerError::UnknownPeriod(_) => "unknown_period",
            TrackerError::Export(_) => "export_failed",
        }
    }
}
