use std::env;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use piper::{parser, pipeline};

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let spec = match parser::split(env::args().skip(1)) {
		Ok(spec) => spec,
		Err(e) => {
			eprintln!("piper: {}", e);
			eprintln!("usage: piper cmd [args...] [/ cmd [args...]]...");
			return ExitCode::from(2);
		}
	};

	match pipeline::run(&spec) {
		Ok(result) => {
			for stage in result.stages() {
				debug!(stage = stage.stage, pid = %stage.pid, status = %stage.status, "stage finished");
			}
			// Pipeline convention: report the final stage's status.
			ExitCode::from(result.exit_code().clamp(0, 255) as u8)
		}
		Err(e) => {
			eprintln!("piper: {}", e);
			ExitCode::from(2)
		}
	}
}
