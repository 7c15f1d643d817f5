#![forbid(unsafe_code)]

pub mod error;
pub mod domain;
pub mod partition;
pub mod shell;
pub mod split;

pub mod remote {
    pub mod local;
    pub mod recording;
    pub mod session;
    pub mod ssh;
}

pub mod runner;
pub mod workspace;
pub mod transport;
pub mod dispatch;
pub mod pool;
pub mod pipeline;

// Re-exports: stable API surface
pub use dispatch::{Conversion, PrintDispatcher};
pub use domain::{Chunk, Credentials, Document, OutputQueue, SideMode};
pub use partition::{PageRange, partition};
pub use pipeline::{Pipeline, RunConfig, plan};
pub use pool::{SessionFactory, SessionPool};
pub use remote::session::{CommandOutput, RemoteSession};
pub use runner::{CommandRunner, FailurePolicy, Stage};
