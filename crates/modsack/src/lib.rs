//! Selection-and-resolution core for a package manager.
//!
//! Given a universe of units (packages or module streams), this crate
//! produces consistent subsets of it: bitmap sets over dense unit ids
//! ([`IdSet`]), a generic ownership container with include/exclude
//! overlays and filtered query views ([`Sack`], [`Query`]), and
//! dependency-aware module activation that delegates consistency to an
//! external solver ([`ModuleSack`], [`DependencySolver`]).
//!
//! The universe can be rebuilt at any time (typically when repository
//! metadata is reloaded). Everything that reaches back into it — query
//! views, unit handles — registers with the generation's [`HandleGuard`]
//! and turns into a checked [`SackError::InvalidHandle`] error instead of
//! a stale read once the generation is gone.
//!
//! Constraint solving, metadata download, cache formats and the
//! transaction executor are external collaborators consumed through
//! narrow interfaces; nothing here performs I/O.

pub mod activation;
pub mod config;
pub mod error;
pub mod handle;
pub mod id_set;
pub mod module;
pub mod query;
pub mod sack;
pub mod solver;

pub use activation::ModuleSack;
pub use config::ModuleConfig;
pub use error::{Result, SackError};
pub use handle::{AliasHandle, HandleGuard, OwningHandle};
pub use id_set::{IdSet, UnitId};
pub use module::{DefaultStreams, Module, ModuleState, SYSTEM_REPO_ID};
pub use query::{Predicate, Query};
pub use sack::Sack;
pub use solver::{DependencySolver, Problem};
