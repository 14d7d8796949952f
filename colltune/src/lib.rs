//! Algorithm/protocol selection core for collective-communication tuner plugins.
//!
//! A host runtime calls into a tuner once per communicator (`init`), once per
//! collective (`get_coll_info`), and once at teardown (`destroy`). This crate
//! holds the pieces behind those calls:
//!
//! - [`ContextPool`]: fixed-capacity, first-fit table of per-communicator
//!   contexts addressed by generation-checked [`ContextHandle`]s.
//! - [`SmallAllReducePolicy`]: forces Tree + LL for small all-reduce on large
//!   clusters and leaves every other call alone.
//! - [`LogSink`]: the host's logging callback as an injected capability.
//!
//! The C ABI lives in the `colltune-plugin` crate.

pub mod config;
pub mod decision;
pub mod error;
pub mod log;
pub mod pool;
pub mod tuner;
pub mod types;

/// Human-readable plugin name reported to the host and used as log prefix.
pub const PLUGIN_NAME: &str = "colltune";

pub use config::TunerConfig;
pub use decision::{CollChoice, CollRequest, Selection, SmallAllReducePolicy};
pub use error::{ErrorKind, Result, TunerError};
pub use log::{LogRecord, LogSink, RecordingSink, SharedSink, TracingSink};
pub use pool::{Context, ContextHandle, ContextPool};
pub use tuner::Tuner;
pub use types::{Algorithm, CollType, LogLevel, Protocol, Subsys, UNDEF};
