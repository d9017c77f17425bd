//! The orchestrator: wires stages together and drives them to completion.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::pipe::PipeEndpoint;
use crate::spawn::{self, Redirections};
use crate::types::{ChildProcess, PipelineResult, PipelineSpec};
use crate::wait;

/// Spawns the whole pipeline and waits for it to finish.
///
/// Setup failures come back as an error, after every stage spawned up to
/// that point has been terminated and reaped. Stages failing at run time
/// are not errors here; they are entries in the [`PipelineResult`].
pub fn run(spec: &PipelineSpec) -> Result<PipelineResult, PipelineError> {
	spawn(spec)?.wait()
}

/// Spawns every stage of the pipeline without waiting.
pub fn spawn(spec: &PipelineSpec) -> Result<RunningPipeline, PipelineError> {
	// Convert every argv up front: an interior nul byte is a validation
	// failure and must surface before any pipe or process exists.
	let argvs: Vec<Vec<CString>> = spec
		.stages()
		.iter()
		.map(|command| command.to_argv())
		.collect::<Result<_, _>>()?;

	let mut children = Vec::with_capacity(spec.len());
	match spawn_stages(&argvs, &mut children) {
		Ok(()) => Ok(RunningPipeline { children }),
		Err(e) => {
			// Stages spawned before the failure must not linger as
			// zombies, and their pipeline is broken anyway. Every pipe end
			// this process held was dropped on the way out of
			// spawn_stages, so a stage blocked on its stdin link already
			// sees EOF; SIGTERM covers one blocked on an inherited stream.
			warn!(spawned = children.len(), error = %e, "pipeline setup failed, terminating spawned stages");
			let _ = RunningPipeline { children }.terminate();
			Err(e)
		}
	}
}

fn spawn_stages(
	argvs: &[Vec<CString>],
	children: &mut Vec<ChildProcess>,
) -> Result<(), PipelineError> {
	let count = argvs.len();
	// Read end of the link written by the previous stage, owned by this
	// process only between the two spawns it concerns.
	let mut prev_read: Option<OwnedFd> = None;

	for (stage, argv) in argvs.iter().enumerate() {
		let is_last = stage + 1 == count;

		// A fresh link per adjacent pair, never reused across iterations,
		// so no two links can alias one underlying pipe.
		let next_link = if is_last { None } else { Some(PipeEndpoint::create()?) };

		let mut redirections = Redirections::default();
		if let Some(read) = prev_read.as_ref() {
			redirections.stdin = Some(read.as_raw_fd());
			redirections.close_in_child.push(read.as_raw_fd());
		}
		if let Some(link) = next_link.as_ref() {
			// The child inherits copies of both ends of the new link and
			// may keep neither: the write end lives on only as its stdout,
			// and the read end belongs to the next stage alone.
			redirections.stdout = link.write_end();
			redirections.close_in_child.extend(link.write_end());
			redirections.close_in_child.extend(link.read_end());
		}

		let pid = spawn::spawn(stage, argv, &redirections)?;
		children.push(ChildProcess { stage, pid });

		// This process never reads or writes the finished link; dropping
		// the read end here closes its last copy on this side, letting EOF
		// reach the new child once its upstream writer exits.
		drop(prev_read.take());
		// Keep only the read side of the new link for the next iteration;
		// into_read_end closes the write side, whose sole owner is now the
		// child just spawned.
		prev_read = next_link.and_then(PipeEndpoint::into_read_end);
	}
	Ok(())
}

/// A fully spawned pipeline whose stages have not yet been reaped.
///
/// Dropping this without calling [`wait`](RunningPipeline::wait) or
/// [`terminate`](RunningPipeline::terminate) leaks zombies; consume it.
#[derive(Debug)]
#[must_use = "a running pipeline must be waited on or terminated"]
pub struct RunningPipeline {
	children: Vec<ChildProcess>,
}

impl RunningPipeline {
	pub fn children(&self) -> &[ChildProcess] {
		&self.children
	}

	/// Blocks until every stage has terminated, in whatever order they
	/// finish, and assembles their statuses in stage order.
	pub fn wait(self) -> Result<PipelineResult, PipelineError> {
		let results = wait::wait_all(&self.children)?;
		Ok(PipelineResult::new(results))
	}

	/// The abort path: SIGTERM every tracked stage, then reap them all.
	pub fn terminate(self) -> Result<PipelineResult, PipelineError> {
		for child in &self.children {
			match signal::kill(child.pid, Signal::SIGTERM) {
				// A stage that already exited is still a zombie until the
				// wait below, so ESRCH should not occur; tolerate it
				// rather than lose the reap.
				Ok(()) | Err(Errno::ESRCH) => {}
				Err(errno) => {
					debug!(stage = child.stage, pid = %child.pid, %errno, "kill failed")
				}
			}
		}
		self.wait()
	}
}
