//! Gitmirror - a write-through file store that mirrors saves into a
//! hosted Git repository.
//!
//! Every save into the wrapped file store is forwarded unchanged, then
//! pushed to a remote Git service as a single-change commit with an
//! automatically derived message and add-vs-edit classification. The
//! application keeps talking to its storage abstraction; version control
//! happens behind it.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`core`] - Domain types, path canonicalization, configuration
//! - [`store`] - The file-store capability (physical and in-memory)
//! - [`vcs`] - The remote Git service capability (Azure DevOps v1)
//! - [`mirror`] - Message policies, the commit pipeline, and the façade
//! - [`identity`] - The acting-principal capability
//! - [`logging`] - The failure sink for swallowed mirroring errors
//!
//! # Correctness Invariants
//!
//! 1. The forward to the wrapped store is never skipped and never rolled
//!    back; mirroring failures are invisible to the saving caller.
//! 2. Every push contains exactly one ref update and one commit with
//!    exactly one file change, addressed at the configured repository
//!    root plus the canonical path.
//! 3. A save classifies as an add if and only if the existence probe
//!    found no item on the target branch.
//! 4. The expected parent commit id is absent only when the target ref
//!    (and its fallback, if any) has no history; the service then
//!    creates the ref.

pub mod core;
pub mod identity;
pub mod logging;
pub mod mirror;
pub mod store;
pub mod vcs;
