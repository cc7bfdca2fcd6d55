use uuid::Uuid;

use crate::host::HostError;

/// Failures of the weekly page workflow. Each is raised where it is detected
/// and handed to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("page not created: {0}")]
    PageCreation(String),

    #[error("template page not found: {0}")]
    MissingTemplate(String),

    #[error("day block {0} has no content")]
    MissingContent(Uuid),

    #[error("already updated: block {uuid} already reads {date}")]
    AlreadySynchronized { uuid: Uuid, date: String },

    #[error("page {0} has no blocks to date")]
    EmptyTree(String),

    #[error("no week {0} weeks from today")]
    OffsetOutOfRange(i32),

    #[error("page name is not a week range: {0}")]
    MalformedPageName(String),

    #[error("another run is still in progress")]
    Busy,

    #[error("{0} cannot run together with {1}")]
    IncompatibleOptions(&'static str, &'static str),

    #[error(transparent)]
    Host(#[from] HostError),
}
