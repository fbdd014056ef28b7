//! mirror
//!
//! The mirroring core: message derivation, the commit pipeline, and the
//! write-interception façade.
//!
//! # Architecture
//!
//! A save flows through one fixed sequence:
//!
//! ```text
//! façade -> canonicalize path -> probe existence -> resolve parent
//!        -> classify -> derive message -> submit push
//! ```
//!
//! Control never flows backward. The façade is the only layer that
//! observes pipeline failures, and it swallows them: the caller's save
//! succeeds whenever the wrapped store accepted it.
//!
//! # Modules
//!
//! - [`message`]: Commit-message policies (rich and generic)
//! - `sync`: The commit pipeline over the remote VCS capability
//! - `store`: The [`MirrorStore`] façade

pub mod message;
mod store;
mod sync;

pub use message::{GenericMessagePolicy, MessageContext, MessagePolicy, RichMessagePolicy};
pub use store::MirrorStore;

use thiserror::Error;

use crate::vcs::VcsError;

/// A failed attempt to mirror one save.
///
/// Never propagated to the saving caller; routed to the configured
/// [`ErrorSink`](crate::logging::ErrorSink) instead.
#[derive(Debug, Error)]
#[error("failed to mirror '{path}' to the remote repository: {source}")]
pub struct MirrorError {
    /// Canonical path of the save that failed to mirror.
    pub path: String,
    /// The underlying remote failure.
    #[source]
    pub source: VcsError,
}
