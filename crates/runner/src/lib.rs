//! Build and run stages for gowatch
//!
//! - External command execution with the project root as working directory
//! - The build pipeline: pre-commands, code generation, compile
//! - Supervision of the built application (single instance, kill then start)

pub mod command;
pub mod pipeline;
pub mod supervisor;

pub use command::Invocation;
pub use pipeline::{Outcome, Pipeline, Stage};
pub use supervisor::{ProcessStarted, RunSpec, Supervisor, SupervisorError};
