use std::ffi::CString;
use std::fmt;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::error::PipelineError;

/// One pipeline stage: an argv whose element 0 is the executable,
/// resolved through `PATH` at exec time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
	args: Vec<String>,
}

impl CommandSpec {
	pub fn new<I, S>(args: I) -> CommandSpec
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		CommandSpec { args: args.into_iter().map(Into::into).collect() }
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}

	/// Argv as nul-terminated strings, ready for `execvp`. Built in the
	/// parent so the forked child never allocates.
	pub(crate) fn to_argv(&self) -> Result<Vec<CString>, PipelineError> {
		self.args
			.iter()
			.map(|a| CString::new(a.as_str()).map_err(PipelineError::from))
			.collect()
	}
}

impl fmt::Display for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.args.join(" "))
	}
}

/// A validated, non-empty sequence of non-empty commands. Constructing one
/// is the only entry point to the pipeline engine, so everything downstream
/// can take validity for granted.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
	stages: Vec<CommandSpec>,
}

impl PipelineSpec {
	pub fn new(stages: Vec<CommandSpec>) -> Result<PipelineSpec, PipelineError> {
		if stages.is_empty() {
			return Err(PipelineError::EmptyPipeline);
		}
		if let Some(stage) = stages.iter().position(CommandSpec::is_empty) {
			return Err(PipelineError::EmptyCommand { stage });
		}
		Ok(PipelineSpec { stages })
	}

	pub fn stages(&self) -> &[CommandSpec] {
		&self.stages
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}
}

/// Terminal state of one stage, as reported by `waitpid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
	Exited(i32),
	Signaled(Signal),
}

impl StageStatus {
	/// Shell-convention numeric code: the exit code itself, or `128 + signo`
	/// for a signal death.
	pub fn code(self) -> i32 {
		match self {
			StageStatus::Exited(code) => code,
			StageStatus::Signaled(sig) => 128 + sig as i32,
		}
	}
}

impl fmt::Display for StageStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			StageStatus::Exited(code) => write!(f, "exited {}", code),
			StageStatus::Signaled(sig) => write!(f, "killed by {}", sig),
		}
	}
}

/// A spawned but not yet reaped stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildProcess {
	pub stage: usize,
	pub pid: Pid,
}

/// A reaped stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageResult {
	pub stage: usize,
	pub pid: Pid,
	pub status: StageStatus,
}

/// Per-stage outcomes in original stage order.
#[derive(Debug, Clone)]
pub struct PipelineResult {
	stages: Vec<StageResult>,
}

impl PipelineResult {
	pub(crate) fn new(mut stages: Vec<StageResult>) -> PipelineResult {
		stages.sort_by_key(|r| r.stage);
		PipelineResult { stages }
	}

	pub fn stages(&self) -> &[StageResult] {
		&self.stages
	}

	pub fn last_status(&self) -> StageStatus {
		// A PipelineSpec is never empty, so neither is this.
		self.stages[self.stages.len() - 1].status
	}

	/// Overall success under the last-stage convention: the pipeline
	/// succeeded iff its final stage exited 0.
	pub fn success(&self) -> bool {
		self.last_status() == StageStatus::Exited(0)
	}

	/// Stricter policy for callers wanting `pipefail` semantics.
	pub fn all_succeeded(&self) -> bool {
		self.stages.iter().all(|r| r.status == StageStatus::Exited(0))
	}

	/// Exit status for a process wrapping this pipeline: the final stage's
	/// code, with signal deaths mapped to `128 + signo`.
	pub fn exit_code(&self) -> i32 {
		self.last_status().code()
	}
}
