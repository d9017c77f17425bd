//! Ownership of one anonymous pipe.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::unistd;

use crate::error::PipelineError;

/// Both descriptors of one anonymous pipe.
///
/// Move-only by construction: each end is an `OwnedFd`, so the endpoint
/// cannot be copied into a second owner and every end still open when the
/// value is dropped is closed. Explicit closes are idempotent.
#[derive(Debug)]
pub struct PipeEndpoint {
	read: Option<OwnedFd>,
	write: Option<OwnedFd>,
}

impl PipeEndpoint {
	/// Allocates a fresh pipe from the kernel.
	pub fn create() -> Result<PipeEndpoint, PipelineError> {
		let (read, write) = unistd::pipe().map_err(PipelineError::PipeCreation)?;
		Ok(PipeEndpoint { read: Some(read), write: Some(write) })
	}

	/// Raw read descriptor, or `None` once closed.
	pub fn read_end(&self) -> Option<RawFd> {
		self.read.as_ref().map(|fd| fd.as_raw_fd())
	}

	/// Raw write descriptor, or `None` once closed.
	pub fn write_end(&self) -> Option<RawFd> {
		self.write.as_ref().map(|fd| fd.as_raw_fd())
	}

	pub fn close_read(&mut self) {
		self.read = None;
	}

	pub fn close_write(&mut self) {
		self.write = None;
	}

	pub fn close_both(&mut self) {
		self.read = None;
		self.write = None;
	}

	/// Hands the read end to the caller and closes the write end.
	///
	/// This is the hand-off between pipeline iterations: once a stage's
	/// child holds duplicates of this link, the orchestrating process must
	/// keep only the read side for the next stage's stdin. Keeping the
	/// write side open would stop the next stage from ever seeing EOF.
	pub fn into_read_end(mut self) -> Option<OwnedFd> {
		self.read.take()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::{Mutex, MutexGuard};

	use nix::fcntl::{fcntl, FcntlArg};

	// Closed-descriptor assertions check raw fd numbers, which another
	// thread's allocation could reuse; serialize the tests that make them.
	static FD_LOCK: Mutex<()> = Mutex::new(());

	fn lock() -> MutexGuard<'static, ()> {
		FD_LOCK.lock().unwrap_or_else(|e| e.into_inner())
	}

	fn fd_is_open(fd: RawFd) -> bool {
		fcntl(fd, FcntlArg::F_GETFD).is_ok()
	}

	#[test]
	fn create_yields_two_open_ends() {
		let _guard = lock();
		let pipe = PipeEndpoint::create().unwrap();
		assert!(fd_is_open(pipe.read_end().unwrap()));
		assert!(fd_is_open(pipe.write_end().unwrap()));
	}

	#[test]
	fn close_is_idempotent() {
		let _guard = lock();
		let mut pipe = PipeEndpoint::create().unwrap();
		let read = pipe.read_end().unwrap();
		pipe.close_read();
		assert!(pipe.read_end().is_none());
		assert!(!fd_is_open(read));
		pipe.close_read();
		pipe.close_both();
		assert!(pipe.write_end().is_none());
	}

	#[test]
	fn drop_closes_remaining_ends() {
		let _guard = lock();
		let (read, write);
		{
			let pipe = PipeEndpoint::create().unwrap();
			read = pipe.read_end().unwrap();
			write = pipe.write_end().unwrap();
		}
		assert!(!fd_is_open(read));
		assert!(!fd_is_open(write));
	}

	#[test]
	fn into_read_end_closes_write_side() {
		let _guard = lock();
		let pipe = PipeEndpoint::create().unwrap();
		let write = pipe.write_end().unwrap();
		let read = pipe.into_read_end().unwrap();
		assert!(!fd_is_open(write));
		assert!(fd_is_open(read.as_raw_fd()));
	}
}
