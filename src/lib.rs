//! # stagehand - third-party source provisioning for native builds
//!
//! stagehand fetches pinned revisions of C/C++ dependencies from Git, trims the
//! checked-out trees down to what the consumer needs, and stages the result
//! for a downstream CMake build.
//!
//! ## Pipeline
//!
//! For each declared dependency, in order:
//!
//! 1. **Install** - skip if the recorded revision matches the pin, otherwise
//!    clone into a scratch directory, check out the pin, copy through the
//!    dependency's filter, prune emptied directories, record the revision.
//! 2. **Build** - run the dependency's build strategy: stage headers, build and
//!    stage binaries per configuration, or declare a CMake sub-project.
//!
//! ## Layout
//!
//! ```text
//! external/
//! ├── <name>/                  installed, filtered source tree
//! ├── include/<name>/          staged headers
//! ├── lib/<name>/<Config>/     staged binaries
//! └── CMakeLists.txt           generated sub-project declarations
//! ```
//!
//! ## Module Organization
//!
//! - [`filter`] - which entries survive a copy
//! - [`fetch`] - revision-cached install of one dependency
//! - [`adapter`] - build strategies
//! - [`staging`] - header and binary sinks
//! - [`descriptor`] - the aggregate `CMakeLists.txt`
//! - [`driver`] - the ordered, fail-fast run

/// Build strategies that turn installed trees into staged artifacts.
pub mod adapter;

/// Built-in dependency declarations.
pub mod catalog;

/// Settings, layout and manifest parsing.
pub mod config;

/// Dependency declarations.
pub mod dependency;

/// Aggregate `CMakeLists.txt` writer.
pub mod descriptor;

/// Ordered provisioning run.
pub mod driver;

/// Error taxonomy.
pub mod error;

/// Revision-cached source installation.
pub mod fetch;

/// Copy filter rules.
pub mod filter;

/// Filesystem helpers.
pub mod fsops;

/// Native build tool (CMake) access.
pub mod native;

/// Header and binary staging sinks.
pub mod staging;

/// Terminal UI utilities.
pub mod ui;

/// Version-control access.
pub mod vcs;
