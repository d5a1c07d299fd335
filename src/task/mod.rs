//! Task lifecycle: registry, executor, and runner.

pub mod executor;
pub mod registry;
pub mod runner;
pub mod state;

pub use executor::{Executor, ExecutorDeps};
pub use registry::{Task, TaskRegistry, TaskSummary};
pub use runner::Runner;
pub use state::TaskState;
