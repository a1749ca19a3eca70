use contracts::usecases::common::UseCaseError;
use thiserror::Error;

use crate::shared::api_client::ApiError;

/// Ошибки конечного автомата подачи заявки
///
/// A capacity conflict is not an error: it is `SubmitOutcome::CapacityConflict`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing driver / dates; no network call was made
    #[error("{0}")]
    Validation(String),

    /// `ok: false` from the backend with a reason other than "full"
    #[error("{0}")]
    Business(String),

    #[error(transparent)]
    Transport(#[from] ApiError),
}

impl WorkflowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Business(_) => "business",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<WorkflowError> for UseCaseError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::Validation(message) => UseCaseError::validation(message.clone()),
            WorkflowError::Business(message) => UseCaseError::business(message.clone()),
            WorkflowError::Transport(source) => {
                UseCaseError::external("Penghantaran gagal.").with_details(source.to_string())
            }
        }
    }
}
