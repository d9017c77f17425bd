use nix::errno::Errno;
use thiserror::Error;

/// Setup-time failures of pipeline construction.
///
/// Anything that goes wrong once a stage is actually running is never
/// reported through this type; it shows up as that stage's
/// [`StageStatus`](crate::types::StageStatus) after the final wait.
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("pipeline has no stages")]
	EmptyPipeline,

	#[error("stage {stage} has no arguments")]
	EmptyCommand { stage: usize },

	#[error("argument contains an interior nul byte: {0}")]
	NulByte(#[from] std::ffi::NulError),

	#[error("failed to allocate a pipe: {0}")]
	PipeCreation(#[source] Errno),

	#[error("failed to spawn stage {stage}: {source}")]
	Spawn {
		stage: usize,
		#[source]
		source: Errno,
	},

	#[error("failed to wait for children: {source}")]
	Wait {
		#[source]
		source: Errno,
	},
}

impl PipelineError {
	/// True for errors detected before any process or pipe exists.
	pub fn is_validation(&self) -> bool {
		matches!(
			self,
			PipelineError::EmptyPipeline
				| PipelineError::EmptyCommand { .. }
				| PipelineError::NulByte(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validation_classification() {
		assert!(PipelineError::EmptyPipeline.is_validation());
		assert!(PipelineError::EmptyCommand { stage: 2 }.is_validation());
		assert!(!PipelineError::PipeCreation(Errno::EMFILE).is_validation());
		assert!(!PipelineError::Spawn { stage: 0, source: Errno::EAGAIN }.is_validation());
	}

	#[test]
	fn messages_name_the_stage() {
		let e = PipelineError::EmptyCommand { stage: 3 };
		assert_eq!(e.to_string(), "stage 3 has no arguments");
	}
}
