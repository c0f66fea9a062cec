//! I/O infrastructure layer.
//!
//! This layer handles everything that touches files or output streams.
//!
//! # Contents
//!
//! - [`project`]: Project store interface and in-memory store
//! - [`snapshot`]: Binary project snapshots (postcard)
//! - [`result_log`]: CSV result rows and buffered diagnostics
//! - [`debug_dump`]: PLY dumps of intermediate clouds
//! - [`colormap`]: Depth and distance colour ramps

pub mod colormap;
pub mod debug_dump;
pub mod project;
pub mod result_log;
pub mod snapshot;

pub use debug_dump::DebugDump;
pub use project::{CrossingData, InMemoryProject, ProjectStore, SurveyFile};
pub use result_log::{MemorySink, MessageBuffer, ResultLog, ResultSink, StdoutSink};
