use thiserror::Error;

use viewlink_core::ViewId;

/// Errors from the checked membership operations of [`crate::ViewSync`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("View already linked: {0}")]
    DuplicateView(ViewId),
    #[error("View not linked: {0}")]
    UnknownView(ViewId),
}
