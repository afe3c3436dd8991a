use thiserror::Error;

pub type Result<T> = std::result::Result<T, InsightError>;

/// Which half of the two-step refresh failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    Records,
    Insights,
}

impl FetchStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            FetchStep::Records => "records",
            FetchStep::Insights => "insights",
        }
    }
}

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Failed to fetch {}: {message}", step.as_str())]
    Fetch { step: FetchStep, message: String },

    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl InsightError {
    pub fn fetch(step: FetchStep, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            step,
            message: format!("{err:#}"),
        }
    }
}
