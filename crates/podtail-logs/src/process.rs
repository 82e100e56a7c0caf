use std::io::{self, Read};
use std::process::{Child, Command, Stdio};

use tracing::debug;

/// A running log producer
pub trait LogProcess: Send {
    /// Take the combined stdout/stderr reader. Returns `None` once taken or
    /// when the output could not be captured.
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Ask the process to end. Calling this on an exited process is fine.
    fn terminate(&mut self) -> io::Result<()>;

    /// Reap the process and return its exit code, if it had one
    fn wait(&mut self) -> io::Result<Option<i32>>;
}

/// Starts log producers
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, program: &str, args: &[String]) -> io::Result<Box<dyn LogProcess>>;
}

/// Launches real child processes with stderr folded into stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, program: &str, args: &[String]) -> io::Result<Box<dyn LogProcess>> {
        // Both streams write into one pipe, the equivalent of `2>&1`
        let (reader, writer) = io::pipe()?;
        let stderr_writer = writer.try_clone()?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);

        let child = command.spawn()?;
        // The command still holds our copies of the write end; drop them so
        // the reader sees EOF once the child exits.
        drop(command);

        debug!(program, pid = child.id(), "launched log process");

        Ok(Box::new(ChildProcess {
            child,
            output: Some(reader),
        }))
    }
}

struct ChildProcess {
    child: Child,
    output: Option<io::PipeReader>,
}

impl LogProcess for ChildProcess {
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
        self.output
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.wait()?.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_fails_to_launch() {
        let result = SystemLauncher.launch("podtail-no-such-binary", &[]);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_and_stderr_are_merged() {
        let args = vec![
            "-c".to_string(),
            "echo out; echo err >&2; echo done".to_string(),
        ];
        let mut process = SystemLauncher.launch("sh", &args).unwrap();
        let mut output = String::new();
        process
            .take_output()
            .unwrap()
            .read_to_string(&mut output)
            .unwrap();

        assert_eq!(output, "out\nerr\ndone\n");
        assert_eq!(process.wait().unwrap(), Some(0));
        assert!(process.take_output().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_ends_blocked_process() {
        let args = vec!["-c".to_string(), "exec sleep 30".to_string()];
        let mut process = SystemLauncher.launch("sh", &args).unwrap();
        let mut output = process.take_output().unwrap();

        process.terminate().unwrap();
        let mut rest = Vec::new();
        output.read_to_end(&mut rest).unwrap();

        assert!(rest.is_empty());
        // Killed by signal, so no exit code
        assert_eq!(process.wait().unwrap(), None);
    }
}
