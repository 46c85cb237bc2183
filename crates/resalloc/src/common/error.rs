use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A claim batch cannot be satisfied, even after allowed
    /// preemption/dwelling. Recoverable: the caller marks the task
    /// conflict (or error) and may retry later.
    #[error("Schedule error: {0}")]
    ScheduleError(String),
    /// The external estimator produced malformed or missing resource
    /// quantities. The task goes to error; no claims are touched.
    #[error("Estimation error: {0}")]
    EstimationError(String),
    /// A store mutation could not be applied. Any partially prepared
    /// claims are discarded; the task keeps its prior state.
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<String> for SchedulerError {
    fn from(e: String) -> Self {
        Self::GenericError(e)
    }
}

impl From<&str> for SchedulerError {
    fn from(e: &str) -> Self {
        Self::GenericError(e.to_string())
    }
}

impl SchedulerError {
    pub fn schedule_error(message: impl Into<String>) -> Self {
        Self::ScheduleError(message.into())
    }

    pub fn estimation_error(message: impl Into<String>) -> Self {
        Self::EstimationError(message.into())
    }
}
