use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Runs an external command and returns its standard output as lines.
///
/// Failures are not errors at this layer: a missing executable or a
/// non-zero exit yields an empty result and callers treat it as "no data".
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Vec<String>;
}

/// Runs commands as real child processes.
///
/// Arguments are handed over as a discrete vector; nothing goes through a
/// shell.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Vec<String> {
        debug!(program, ?args, "running command");

        let output = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(program, error = %e, "failed to launch command");
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                program,
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "command exited unsuccessfully"
            );
            return Vec::new();
        }

        split_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Split captured stdout into lines, dropping surrounding blank space.
/// Empty output maps to no lines at all, never to a single empty line.
pub(crate) fn split_output(stdout: &str) -> Vec<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
