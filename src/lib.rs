//! Account housekeeping against the GitHub API.
//!
//! Two binaries share this crate:
//!
//! * `set-policies` enforces repository settings across an account and
//!   prefixes forks with `fork-`.
//! * `update-readme` recomputes profile statistics and splices them into
//!   marker regions of a README.

pub mod config;
pub mod fetch;
pub mod format;
pub mod github;
pub mod logging;
pub mod policy;
pub mod readme;
pub mod render;
pub mod stats;
pub mod years;
