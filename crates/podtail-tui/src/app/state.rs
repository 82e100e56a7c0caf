use ratatui::widgets::ListState;
use thiserror::Error;
use tracing::{debug, warn};

use podtail_kubectl::{CommandRunner, Kubectl};
use podtail_logs::{DisplayBuffer, LogStreamManager, StreamError};
use podtail_types::{StreamSettings, StreamState};

use super::SelectionController;

/// Input rejected before a stream is started
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a pod.")]
    NoPodSelected,
    #[error("Please enter a valid non-negative integer for the tail count, or leave it empty for all lines.")]
    InvalidTail(String),
}

/// Focusable fields in the header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Namespace,
    Pod,
    Container,
    Tail,
    Follow,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Namespace,
        Field::Pod,
        Field::Container,
        Field::Tail,
        Field::Follow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Namespace => "Namespace",
            Self::Pod => "Pod",
            Self::Container => "Container",
            Self::Tail => "Tail",
            Self::Follow => "Follow",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether this field is backed by a discovery list
    pub fn is_selector(&self) -> bool {
        matches!(self, Self::Namespace | Self::Pod | Self::Container)
    }
}

/// Popup list for choosing a namespace, pod or container
pub struct Picker {
    pub field: Field,
    pub items: Vec<String>,
    pub list_state: ListState,
}

impl Picker {
    fn new(field: Field, items: Vec<String>, current: Option<&str>) -> Self {
        let selected = current
            .and_then(|c| items.iter().position(|i| i == c))
            .unwrap_or(0);
        let mut list_state = ListState::default();
        list_state.select(Some(selected));
        Self {
            field,
            items,
            list_state,
        }
    }

    /// Move selection up, wrapping around
    pub fn up(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Move selection down, wrapping around
    pub fn down(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected(&self) -> Option<&str> {
        self.list_state
            .selected()
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Focused header field
    pub focus: Field,

    /// Raw tail count text; empty means all lines
    pub tail_input: String,

    /// Is the tail field being edited?
    pub tail_editing: bool,

    /// Follow new lines (`-f`)?
    pub follow: bool,

    /// Open picker popup, if any
    pub picker: Option<Picker>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Modal error message (if any)
    pub error_message: Option<String>,
}

impl UiState {
    fn new(settings: StreamSettings) -> Self {
        Self {
            focus: Field::Namespace,
            tail_input: settings.tail.map(|t| t.to_string()).unwrap_or_default(),
            tail_editing: false,
            follow: settings.follow,
            picker: None,
            help_visible: false,
            error_message: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Discovery chain and current selection
    pub selection: SelectionController,

    /// The single log stream
    pub streams: LogStreamManager,

    /// Log view content; written only from the tick
    pub display: DisplayBuffer,

    /// UI state
    pub ui_state: UiState,

    /// Status line message
    pub status: String,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(
        selection: SelectionController,
        streams: LogStreamManager,
        settings: StreamSettings,
    ) -> Self {
        Self {
            selection,
            streams,
            display: DisplayBuffer::new(),
            ui_state: UiState::new(settings),
            status: "Ready".to_string(),
            should_quit: false,
        }
    }

    /// Selectors and buttons are disabled while discovery is pending
    pub fn controls_enabled(&self) -> bool {
        !self.selection.is_loading()
    }

    pub fn can_start(&self) -> bool {
        self.controls_enabled() && !self.streams.is_active()
    }

    pub fn can_stop(&self) -> bool {
        self.controls_enabled() && self.streams.is_active()
    }

    pub fn stream_state(&self) -> StreamState {
        self.streams.state()
    }

    /// Periodic tick: drain the log queue, then run one deferred discovery step
    pub fn on_tick<R: CommandRunner>(&mut self, kubectl: &Kubectl<R>) {
        self.pump_logs();

        if let Some(done) = self.selection.run_pending(kubectl) {
            self.status = match self.selection.pending() {
                Some(next) => next.loading_message(),
                None => done,
            };
        }
    }

    /// Move queued lines into the display buffer
    pub fn pump_logs(&mut self) -> usize {
        let drained = self.display.drain_from(self.streams.queue());
        if drained > 0 {
            self.status = "Streaming logs...".to_string();
        }
        drained
    }

    /// Request a namespace reload
    pub fn refresh_namespaces(&mut self) {
        if self.controls_enabled() {
            self.status = self.selection.request_namespaces();
        }
    }

    /// Read the header inputs into stream settings
    pub fn stream_settings(&self) -> Result<StreamSettings, ValidationError> {
        let raw = self.ui_state.tail_input.trim();
        let tail = if raw.is_empty() {
            None
        } else {
            Some(
                raw.parse::<u64>()
                    .map_err(|_| ValidationError::InvalidTail(raw.to_string()))?,
            )
        };
        Ok(StreamSettings {
            follow: self.ui_state.follow,
            tail,
        })
    }

    /// Start streaming the selected pod.
    ///
    /// Validation failures open the error dialog and change nothing else.
    /// Returns whether a new stream was started.
    pub fn start_stream(&mut self) -> bool {
        if !self.can_start() {
            debug!("start ignored while disabled");
            return false;
        }

        let validated = self
            .selection
            .target()
            .ok_or(ValidationError::NoPodSelected)
            .and_then(|target| Ok((target, self.stream_settings()?)));
        let (target, settings) = match validated {
            Ok(v) => v,
            Err(e) => {
                self.show_error(e.to_string());
                return false;
            }
        };

        match self.streams.start(target, settings) {
            Ok(()) => {
                self.display.clear();
                self.status = "Loading logs...".to_string();
                true
            }
            Err(StreamError::AlreadyActive) => false,
            Err(e) => {
                warn!(error = %e, "failed to start log stream");
                self.show_error(e.to_string());
                false
            }
        }
    }

    /// Stop the running stream
    pub fn stop_stream(&mut self) {
        if self.can_stop() && self.streams.stop() {
            self.status = "Log streaming stopped.".to_string();
        }
    }

    /// Clear the log view
    pub fn clear_logs(&mut self) {
        if self.controls_enabled() {
            self.display.clear();
            self.status = "Logs cleared.".to_string();
        }
    }

    /// Open the picker for a selector field
    pub fn open_picker(&mut self, field: Field) {
        if !self.controls_enabled() {
            return;
        }
        let selection = self.selection.selection();
        let (items, current) = match field {
            Field::Namespace => (self.selection.namespaces(), Some(selection.namespace())),
            Field::Pod => (self.selection.pods(), selection.pod()),
            Field::Container => (self.selection.containers(), selection.container()),
            Field::Tail | Field::Follow => return,
        };
        if items.is_empty() {
            self.status = format!("No {}s to choose from.", field.label().to_lowercase());
            return;
        }
        self.ui_state.picker = Some(Picker::new(field, items.to_vec(), current));
    }

    /// Apply the picker's highlighted entry
    pub fn picker_select(&mut self) {
        let Some(picker) = self.ui_state.picker.take() else {
            return;
        };
        let Some(choice) = picker.selected().map(str::to_string) else {
            return;
        };
        match picker.field {
            Field::Namespace => self.status = self.selection.select_namespace(&choice),
            Field::Pod => self.status = self.selection.select_pod(&choice),
            Field::Container => {
                self.selection.select_container(&choice);
                self.status = format!("Container {} selected.", choice);
            }
            Field::Tail | Field::Follow => {}
        }
    }

    /// Activate the focused field
    pub fn activate(&mut self) {
        match self.ui_state.focus {
            field if field.is_selector() => self.open_picker(field),
            Field::Tail => self.ui_state.tail_editing = true,
            Field::Follow => self.toggle_follow(),
            _ => {}
        }
    }

    pub fn toggle_follow(&mut self) {
        self.ui_state.follow = !self.ui_state.follow;
    }

    pub fn tail_input_char(&mut self, c: char) {
        self.ui_state.tail_input.push(c);
    }

    pub fn tail_input_backspace(&mut self) {
        self.ui_state.tail_input.pop();
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::{Duration, Instant};

    use podtail_logs::{LineQueue, LogProcess, ProcessLauncher};

    use super::*;

    /// Output that blocks until the paired sender is dropped
    struct Held(mpsc::Receiver<()>);

    impl Read for Held {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    struct HeldProcess {
        output: Option<Held>,
        release: Option<mpsc::Sender<()>>,
    }

    impl LogProcess for HeldProcess {
        fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
            self.output.take().map(|o| Box::new(o) as Box<dyn Read + Send>)
        }

        fn terminate(&mut self) -> io::Result<()> {
            self.release.take();
            Ok(())
        }

        fn wait(&mut self) -> io::Result<Option<i32>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct HeldLauncher {
        launches: AtomicUsize,
        args: Mutex<Vec<Vec<String>>>,
    }

    impl ProcessLauncher for HeldLauncher {
        fn launch(&self, _program: &str, args: &[String]) -> io::Result<Box<dyn LogProcess>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut all) = self.args.lock() {
                all.push(args.to_vec());
            }
            let (tx, rx) = mpsc::channel();
            Ok(Box::new(HeldProcess {
                output: Some(Held(rx)),
                release: Some(tx),
            }))
        }
    }

    struct NoCluster;

    impl CommandRunner for NoCluster {
        fn run(&self, _program: &str, _args: &[String]) -> Vec<String> {
            vec!["dev".to_string()]
        }
    }

    fn app(launcher: &Arc<HeldLauncher>) -> AppState {
        let streams = LogStreamManager::new("kubectl", launcher.clone(), LineQueue::new());
        let mut selection = SelectionController::new("dev");
        selection.select_pod("api-0");
        // Drop the queued container lookup so controls are enabled
        let kubectl = Kubectl::with_runner("kubectl", NoCluster);
        selection.run_pending(&kubectl);
        AppState::new(selection, streams, StreamSettings::default())
    }

    fn wait_until(state: &AppState, expected: StreamState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.stream_state() != expected {
            assert!(Instant::now() < deadline, "timed out waiting for {:?}", expected);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_second_start_creates_no_second_process() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);

        assert!(state.start_stream());
        assert!(!state.can_start());
        assert!(!state.start_stream());

        wait_until(&state, StreamState::Streaming);
        state.stop_stream();
        assert_eq!(state.status, "Log streaming stopped.");
        state.streams.shutdown(Duration::from_secs(5));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert!(state.can_start());
    }

    #[test]
    fn test_invalid_tail_opens_dialog_without_starting() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);
        state.ui_state.tail_input = "-5".to_string();

        assert!(!state.start_stream());
        assert!(state.ui_state.error_message.is_some());
        assert_eq!(state.stream_state(), StreamState::Idle);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);

        state.ui_state.tail_input = "lots".to_string();
        assert_eq!(
            state.stream_settings(),
            Err(ValidationError::InvalidTail("lots".to_string()))
        );
    }

    #[test]
    fn test_missing_pod_opens_dialog() {
        let launcher = Arc::new(HeldLauncher::default());
        let streams = LogStreamManager::new("kubectl", launcher.clone(), LineQueue::new());
        let mut state = AppState::new(
            SelectionController::new("dev"),
            streams,
            StreamSettings::default(),
        );

        assert!(!state.start_stream());
        assert_eq!(
            state.ui_state.error_message.as_deref(),
            Some("Please select a pod.")
        );
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_tail_streams_everything() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);
        state.ui_state.tail_input.clear();
        state.toggle_follow();

        assert_eq!(
            state.stream_settings(),
            Ok(StreamSettings {
                follow: false,
                tail: None
            })
        );
        assert!(state.start_stream());
        wait_until(&state, StreamState::Streaming);
        state.streams.shutdown(Duration::from_secs(5));

        let args = launcher.args.lock().unwrap();
        assert_eq!(args[0], vec!["logs", "api-0", "-n", "dev", "-c", "dev"]);
    }

    #[test]
    fn test_pump_updates_status_only_when_lines_arrive() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);
        state.status = "Ready".to_string();

        assert_eq!(state.pump_logs(), 0);
        assert_eq!(state.status, "Ready");

        state.streams.queue().push("first");
        state.streams.queue().push("second");
        assert_eq!(state.pump_logs(), 2);
        assert_eq!(state.status, "Streaming logs...");
        assert_eq!(state.display.lines(), ["first", "second"]);
    }

    #[test]
    fn test_controls_disabled_while_loading() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);
        state.refresh_namespaces();

        assert!(!state.controls_enabled());
        assert!(!state.start_stream());
        state.open_picker(Field::Namespace);
        assert!(state.ui_state.picker.is_none());

        let kubectl = Kubectl::with_runner("kubectl", NoCluster);
        state.on_tick(&kubectl);
        assert_eq!(state.status, "Loading pods in namespace dev...");
    }

    #[test]
    fn test_picker_selects_container() {
        let launcher = Arc::new(HeldLauncher::default());
        let mut state = app(&launcher);

        state.open_picker(Field::Container);
        // NoCluster reports a single container named "dev"
        let picker = state.ui_state.picker.as_mut().unwrap();
        assert_eq!(picker.selected(), Some("dev"));
        picker.down();
        assert_eq!(picker.selected(), Some("dev"));

        state.picker_select();
        assert!(state.ui_state.picker.is_none());
        assert_eq!(state.selection.selection().container(), Some("dev"));
    }

    #[test]
    fn test_field_focus_cycles() {
        assert_eq!(Field::Follow.next(), Field::Namespace);
        assert_eq!(Field::Namespace.prev(), Field::Follow);
        assert_eq!(Field::Pod.next(), Field::Container);
    }
}
