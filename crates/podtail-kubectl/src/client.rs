use tracing::debug;

use podtail_types::{StreamSettings, StreamTarget};

use crate::runner::{CommandRunner, SystemRunner};

/// Typed facade over the `kubectl` command line
#[derive(Clone, Debug)]
pub struct Kubectl<R = SystemRunner> {
    program: String,
    runner: R,
}

impl Kubectl<SystemRunner> {
    /// Create a facade that runs the given kubectl executable
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_runner(program, SystemRunner)
    }
}

impl<R: CommandRunner> Kubectl<R> {
    pub fn with_runner(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Path or name of the kubectl executable
    pub fn program(&self) -> &str {
        &self.program
    }

    /// List namespace names
    pub fn namespaces(&self) -> Vec<String> {
        self.names(&["get", "namespaces", "-o", "jsonpath={.items[*].metadata.name}"])
    }

    /// List pod names in a namespace
    pub fn pods(&self, namespace: &str) -> Vec<String> {
        self.names(&[
            "get",
            "pods",
            "-n",
            namespace,
            "-o",
            "jsonpath={.items[*].metadata.name}",
        ])
    }

    /// List container names of a pod
    pub fn containers(&self, namespace: &str, pod: &str) -> Vec<String> {
        self.names(&[
            "get",
            "pod",
            pod,
            "-n",
            namespace,
            "-o",
            "jsonpath={.spec.containers[*].name}",
        ])
    }

    /// Run a jsonpath query whose output is whitespace separated names
    fn names(&self, args: &[&str]) -> Vec<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let names: Vec<String> = self
            .runner
            .run(&self.program, &args)
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(str::to_string)
            .collect();
        debug!(count = names.len(), query = %args.join(" "), "discovery finished");
        names
    }
}

/// Build the argument vector for `kubectl logs`.
///
/// `--tail` is only present for bounded history and `-f` only when
/// following.
pub fn logs_args(target: &StreamTarget, settings: &StreamSettings) -> Vec<String> {
    let mut args = vec![
        "logs".to_string(),
        target.pod.clone(),
        "-n".to_string(),
        target.namespace.clone(),
    ];
    if let Some(tail) = settings.tail {
        args.push(format!("--tail={}", tail));
    }
    if let Some(container) = &target.container {
        args.push("-c".to_string());
        args.push(container.clone());
    }
    if settings.follow {
        args.push("-f".to_string());
    }
    args
}
