//! Reaping children and collecting their exit statuses.

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

use crate::error::PipelineError;
use crate::types::{ChildProcess, StageResult, StageStatus};

/// Blocks until every listed child has terminated and returns one result
/// per child.
///
/// Each pid is waited on directly, so completion order does not matter (the
/// kernel keeps a zombie's status until its parent asks for it) and children
/// belonging to anyone else in this process are never touched.
pub fn wait_all(children: &[ChildProcess]) -> Result<Vec<StageResult>, PipelineError> {
	let mut results = Vec::with_capacity(children.len());
	for &child in children {
		let status = wait_one(child.pid)?;
		debug!(stage = child.stage, pid = %child.pid, %status, "reaped stage");
		results.push(StageResult { stage: child.stage, pid: child.pid, status });
	}
	Ok(results)
}

fn wait_one(pid: Pid) -> Result<StageStatus, PipelineError> {
	loop {
		match waitpid(pid, None) {
			Ok(WaitStatus::Exited(_, code)) => return Ok(StageStatus::Exited(code)),
			Ok(WaitStatus::Signaled(_, signal, _)) => {
				return Ok(StageStatus::Signaled(signal))
			}
			// Without WUNTRACED or WCONTINUED a blocking waitpid only
			// reports termination; ignore anything else and keep waiting.
			Ok(_) => continue,
			Err(Errno::EINTR) => continue,
			Err(errno) => return Err(PipelineError::Wait { source: errno }),
		}
	}
}
