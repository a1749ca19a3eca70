pub mod context;
pub mod errors;
pub mod executor;

pub use context::{PendingForce, WorkflowContext};
pub use errors::WorkflowError;
pub use executor::{AppliedLeave, LeaveWorkflow, SubmitOutcome};
