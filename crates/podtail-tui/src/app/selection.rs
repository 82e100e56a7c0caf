use tracing::debug;

use podtail_kubectl::{CommandRunner, Kubectl};
use podtail_types::{DEFAULT_NAMESPACE, SelectionState, StreamTarget};

/// A discovery call waiting for the next tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Discovery {
    Namespaces,
    Pods { namespace: String },
    Containers { namespace: String, pod: String },
}

impl Discovery {
    /// Status shown while this step is outstanding
    pub fn loading_message(&self) -> String {
        match self {
            Self::Namespaces => "Loading namespaces...".to_string(),
            Self::Pods { namespace } => format!("Loading pods in namespace {}...", namespace),
            Self::Containers { pod, .. } => format!("Loading containers in pod {}...", pod),
        }
    }
}

/// Drives the namespace → pods → containers discovery chain.
///
/// Each step is requested first (controls disabled, status set) and run on
/// the following tick, so the UI gets a frame out before the blocking call.
pub struct SelectionController {
    selection: SelectionState,
    remembered_namespace: String,
    namespaces: Vec<String>,
    pods: Vec<String>,
    containers: Vec<String>,
    pending: Option<Discovery>,
}

impl SelectionController {
    pub fn new(remembered_namespace: impl Into<String>) -> Self {
        let remembered_namespace = remembered_namespace.into();
        Self {
            selection: SelectionState::new(remembered_namespace.clone()),
            remembered_namespace,
            namespaces: Vec::new(),
            pods: Vec::new(),
            containers: Vec::new(),
            pending: None,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn pods(&self) -> &[String] {
        &self.pods
    }

    pub fn containers(&self) -> &[String] {
        &self.containers
    }

    pub fn pending(&self) -> Option<&Discovery> {
        self.pending.as_ref()
    }

    /// Controls stay disabled while a discovery step is outstanding
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot for a stream session
    pub fn target(&self) -> Option<StreamTarget> {
        self.selection.target()
    }

    /// Request a fresh namespace listing; returns the loading status
    pub fn request_namespaces(&mut self) -> String {
        self.queue(Discovery::Namespaces)
    }

    /// Operator picked a namespace
    pub fn select_namespace(&mut self, namespace: &str) -> String {
        self.remembered_namespace = namespace.to_string();
        self.selection = self.selection.clone().with_namespace(namespace);
        self.request_pods()
    }

    /// Operator picked a pod
    pub fn select_pod(&mut self, pod: &str) -> String {
        self.selection = self.selection.clone().with_pod(Some(pod.to_string()));
        self.containers.clear();
        match self.selection.pod() {
            Some(_) => self.request_containers(),
            None => "No pod selected.".to_string(),
        }
    }

    /// Operator picked a container; no discovery follows
    pub fn select_container(&mut self, container: &str) {
        self.selection = self
            .selection
            .clone()
            .with_container(Some(container.to_string()));
    }

    fn request_pods(&mut self) -> String {
        let namespace = self.selection.namespace().to_string();
        self.queue(Discovery::Pods { namespace })
    }

    fn request_containers(&mut self) -> String {
        let Some(pod) = self.selection.pod().map(str::to_string) else {
            return "No pod selected.".to_string();
        };
        self.queue(Discovery::Containers {
            namespace: self.selection.namespace().to_string(),
            pod,
        })
    }

    fn queue(&mut self, step: Discovery) -> String {
        let status = step.loading_message();
        self.pending = Some(step);
        status
    }

    /// Run the outstanding discovery step, if any.
    ///
    /// Returns the completion status message. A step may queue the next one
    /// (namespaces cascade into pods, pods into containers).
    pub fn run_pending<R: CommandRunner>(&mut self, kubectl: &Kubectl<R>) -> Option<String> {
        let step = self.pending.take()?;
        debug!(?step, "running discovery");

        let status = match step {
            Discovery::Namespaces => {
                let names = kubectl.namespaces();
                self.apply_namespaces(names)
            }
            Discovery::Pods { namespace } => {
                let names = kubectl.pods(&namespace);
                self.apply_pods(&namespace, names)
            }
            Discovery::Containers { namespace, pod } => {
                let names = kubectl.containers(&namespace, &pod);
                self.apply_containers(&namespace, &pod, names)
            }
        };
        Some(status)
    }

    fn apply_namespaces(&mut self, mut names: Vec<String>) -> String {
        if names.is_empty() {
            names.push(DEFAULT_NAMESPACE.to_string());
        }
        let namespace = if names.contains(&self.remembered_namespace) {
            self.remembered_namespace.clone()
        } else {
            names[0].clone()
        };
        self.namespaces = names;
        self.remembered_namespace = namespace.clone();
        self.selection = self.selection.clone().with_namespace(namespace);
        self.pods.clear();
        self.containers.clear();
        self.request_pods();
        "Namespaces loaded.".to_string()
    }

    fn apply_pods(&mut self, namespace: &str, names: Vec<String>) -> String {
        // The operator moved on while this step was queued
        if self.selection.namespace() != namespace {
            return self.request_pods();
        }
        self.pods = names;
        self.containers.clear();
        match self.pods.first().cloned() {
            Some(first) => {
                self.selection = self.selection.clone().with_pod(Some(first));
                self.request_containers();
                "Pods loaded.".to_string()
            }
            None => {
                self.selection = self.selection.clone().with_pod(None);
                "No pods found.".to_string()
            }
        }
    }

    fn apply_containers(&mut self, namespace: &str, pod: &str, names: Vec<String>) -> String {
        if self.selection.namespace() != namespace || self.selection.pod() != Some(pod) {
            return self.request_containers();
        }
        self.containers = names;
        match self.containers.first().cloned() {
            Some(first) => {
                self.selection = self.selection.clone().with_container(Some(first));
                "Containers loaded.".to_string()
            }
            None => {
                self.selection = self.selection.clone().with_container(None);
                "No containers found.".to_string()
            }
        }
    }
}
