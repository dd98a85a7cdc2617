//! Locally tracked workflows.
//!
//! There is no workflow backend: items live in `workflows.json` under the
//! state directory and every command loads, changes and saves the whole board.

pub mod followup;
pub mod items;
pub mod store;

use crate::models::WorkflowStatus;
use std::path::PathBuf;
use thiserror::Error;

pub use followup::follow_up_cards;
pub use items::{WorkflowAction, WorkflowMetrics};
pub use store::{InsightSnapshot, WorkflowStore};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Insight card {0} is not in the last page run. Run the page again and use an id it shows")]
    InsightNotFound(String),

    #[error("Cannot {action} workflow {id}: it is {status}")]
    InvalidTransition {
        id: String,
        status: WorkflowStatus,
        action: String,
    },

    #[error("State file {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("State file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
