//! Core ingestion, extraction and risk-evaluation engine for RBAC Atlas.
//!
//! Data flow is strictly one-way: a source string goes
//! through [`resolver`] then [`render`] to a manifest sequence, [`extract`]
//! builds three indexed views from it, [`evaluate`] joins permissions
//! against the embedded [`catalog`], and [`format`] shapes the result for
//! a CLI collaborator to render. [`orchestrator`] composes all of it.

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_yaml;

extern crate tera;
extern crate walkdir;

#[macro_use]
extern crate log;

extern crate reqwest;
extern crate url;
extern crate regex;

extern crate chrono;
extern crate once_cell;
extern crate threadpool;

#[macro_use]
extern crate failure;

/// Crate-wide error type and `ErrorKind` enum.
pub mod error;
pub use error::{Error, ErrorKind};
pub type Result<T> = std::result::Result<T, failure::Error>;

/// The embedded, process-wide risk rule catalog.
pub mod catalog;
pub use catalog::{Catalog, CatalogRule};

/// Typed data model: manifests, identities, workloads, RBAC, results.
pub mod model;

/// Source resolution: local file, remote HTTP, directory.
pub mod resolver;

/// Renderers: Plain-YAML, Chart, Kustomize.
pub mod render;

/// Identity/Workload/RBAC extractors.
pub mod extract;

/// The wildcard-aware policy evaluator.
pub mod evaluate;
pub use evaluate::Evaluator;

/// Bounded worker pool + cancellation token (§5).
pub mod concurrency;
pub use concurrency::CancellationToken;

/// `RbacOpsConfig`, loaded from `--config`/`RBAC_OPS_CONFIG_PATH`.
pub mod config;
pub use config::RbacOpsConfig;

/// Composes resolver → renderer → extractors → evaluator.
pub mod orchestrator;
pub use orchestrator::{AnalyzeOptions, Orchestrator};

/// Formatter Adapter: shapes the joined result for the CLI's renderers.
pub mod format;
pub use format::Report;
