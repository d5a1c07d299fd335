//! Research Assist — async research-task execution with per-thread memory.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod memory;
pub mod task;
