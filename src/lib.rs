//! Shell-style process pipelines over anonymous pipes.
//!
//! Given an ordered list of commands, [`pipeline::run`] executes each as an
//! independent process with each stage's stdout wired to the next stage's
//! stdin, the machinery behind `cmd1 | cmd2 | ... | cmdN`. The interesting
//! part is descriptor lifecycle: every pipe end is owned by exactly one
//! place at a time, and every copy handed across a fork is closed by whoever
//! does not need it, so readers see EOF exactly when their writers are gone.
//!
//! ```no_run
//! use piper::{parser, pipeline};
//!
//! let spec = parser::split(["echo", "hello", "/", "tr", "a-z", "A-Z"])?;
//! let result = pipeline::run(&spec)?;
//! assert!(result.success());
//! # Ok::<(), piper::PipelineError>(())
//! ```
//!
//! The unrelated [`expr`] module evaluates arithmetic expressions and shares
//! no code with the pipeline engine.

pub mod error;
pub mod expr;
pub mod parser;
pub mod pipe;
pub mod pipeline;
pub mod spawn;
pub mod types;
pub mod wait;

pub use error::PipelineError;
pub use pipeline::{run, RunningPipeline};
pub use types::{
	ChildProcess, CommandSpec, PipelineResult, PipelineSpec, StageResult, StageStatus,
};
