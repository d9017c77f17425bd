//! Child-process creation and in-child descriptor plumbing.

use std::ffi::CString;
use std::os::fd::RawFd;

use nix::unistd::{self, ForkResult, Pid};
use tracing::debug;

use crate::error::PipelineError;

/// Exit status a child reports when it cannot set up its descriptors or
/// execute its program. Exec failure happens after the fork, so there is no
/// way to hand the parent an error value; this status is the only channel.
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// Descriptor plumbing a child performs before exec.
///
/// `close_in_child` must list every pipe descriptor the child inherits,
/// including the `stdin`/`stdout` sources themselves: once those are
/// duplicated onto the standard streams the originals are extra copies of
/// pipe ends, and any copy left open keeps downstream readers from seeing
/// EOF.
#[derive(Debug, Default)]
pub struct Redirections {
	pub stdin: Option<RawFd>,
	pub stdout: Option<RawFd>,
	pub close_in_child: Vec<RawFd>,
}

/// Forks and, in the child, applies `redirections` and execs `argv`.
///
/// Returns the child's pid; `fork` failure maps to [`PipelineError::Spawn`].
/// A failure after the fork (a bad `dup2` or the exec itself) is never seen
/// here — the child exits with [`EXEC_FAILURE_STATUS`] and the parent
/// observes it at wait time. `argv` is fully built before the call, so the
/// child allocates nothing between fork and exec.
pub fn spawn(
	stage: usize,
	argv: &[CString],
	redirections: &Redirections,
) -> Result<Pid, PipelineError> {
	debug_assert!(!argv.is_empty());
	match unsafe { unistd::fork() } {
		Ok(ForkResult::Parent { child }) => {
			debug!(stage, pid = %child, command = ?argv[0], "spawned stage");
			Ok(child)
		}
		Ok(ForkResult::Child) => redirect_and_exec(argv, redirections),
		Err(errno) => Err(PipelineError::Spawn { stage, source: errno }),
	}
}

/// Runs in the forked child; never returns to the caller.
fn redirect_and_exec(argv: &[CString], redirections: &Redirections) -> ! {
	if let Some(fd) = redirections.stdin {
		if unistd::dup2(fd, libc::STDIN_FILENO).is_err() {
			unsafe { libc::_exit(EXEC_FAILURE_STATUS as libc::c_int) }
		}
	}
	if let Some(fd) = redirections.stdout {
		if unistd::dup2(fd, libc::STDOUT_FILENO).is_err() {
			unsafe { libc::_exit(EXEC_FAILURE_STATUS as libc::c_int) }
		}
	}
	for &fd in &redirections.close_in_child {
		let _ = unistd::close(fd);
	}
	let _ = unistd::execvp(&argv[0], argv);
	// Exec returning at all means it failed: not found, not executable,
	// permission denied. stderr is still inherited, so say which command.
	// No allocation here: after a fork of a threaded process the allocator
	// lock may be held by a thread that no longer exists.
	let stderr = std::io::stderr();
	let _ = unistd::write(&stderr, b"piper: ");
	let _ = unistd::write(&stderr, argv[0].to_bytes());
	let _ = unistd::write(&stderr, b": exec failed\n");
	unsafe { libc::_exit(EXEC_FAILURE_STATUS as libc::c_int) }
}
