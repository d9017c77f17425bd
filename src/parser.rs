//! Splitting a flat argument list into per-stage command groups.
//!
//! This sits upstream of the pipeline engine proper: it only groups
//! already-tokenized arguments, it does not tokenize a command line.

use crate::error::PipelineError;
use crate::types::{CommandSpec, PipelineSpec};

/// The stage separator. `/` rather than `|` so an invocation survives an
/// interactive shell without quoting.
pub const SEPARATOR: &str = "/";

/// Splits `args` at each [`SEPARATOR`] token into a validated pipeline.
///
/// A leading, trailing, or doubled separator leaves an empty group and is
/// rejected as [`PipelineError::EmptyCommand`]; an empty argument list is
/// [`PipelineError::EmptyPipeline`].
pub fn split<I, S>(args: I) -> Result<PipelineSpec, PipelineError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut stages: Vec<CommandSpec> = vec![];
	let mut group: Vec<String> = vec![];
	let mut any = false;
	for arg in args {
		let arg = arg.into();
		any = true;
		if arg == SEPARATOR {
			stages.push(CommandSpec::new(std::mem::take(&mut group)));
		} else {
			group.push(arg);
		}
	}
	if !any {
		return Err(PipelineError::EmptyPipeline);
	}
	stages.push(CommandSpec::new(group));
	PipelineSpec::new(stages)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_command() {
		let spec = split(["echo", "hello"]).unwrap();
		assert_eq!(spec.len(), 1);
		assert_eq!(spec.stages()[0].args(), ["echo", "hello"]);
	}

	#[test]
	fn three_stages() {
		let spec = split(["cat", "f", "/", "sort", "-r", "/", "uniq"]).unwrap();
		assert_eq!(spec.len(), 3);
		assert_eq!(spec.stages()[1].args(), ["sort", "-r"]);
		assert_eq!(spec.stages()[2].args(), ["uniq"]);
	}

	#[test]
	fn no_arguments_is_empty_pipeline() {
		let empty: [&str; 0] = [];
		assert!(matches!(split(empty), Err(PipelineError::EmptyPipeline)));
	}

	#[test]
	fn leading_separator_rejected() {
		assert!(matches!(
			split(["/", "cat"]),
			Err(PipelineError::EmptyCommand { stage: 0 })
		));
	}

	#[test]
	fn trailing_separator_rejected() {
		assert!(matches!(
			split(["cat", "/"]),
			Err(PipelineError::EmptyCommand { stage: 1 })
		));
	}

	#[test]
	fn doubled_separator_rejected() {
		assert!(matches!(
			split(["a", "/", "/", "b"]),
			Err(PipelineError::EmptyCommand { stage: 1 })
		));
	}
}
