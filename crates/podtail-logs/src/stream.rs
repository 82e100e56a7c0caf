use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use podtail_kubectl::logs_args;
use podtail_types::{StreamSettings, StreamState, StreamTarget};

use crate::process::{LogProcess, ProcessLauncher};
use crate::queue::LineQueue;

/// How often `wait` checks whether the worker has finished
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("a log stream is already running")]
    AlreadyActive,
    #[error("failed to spawn stream worker: {0}")]
    Spawn(String),
}

/// Slot the worker publishes its process into so `stop` can kill it
type ProcessSlot = Arc<Mutex<Option<Box<dyn LogProcess>>>>;

/// One run of `kubectl logs`
struct StreamSession {
    target: StreamTarget,
    cancel: CancellationToken,
    process: ProcessSlot,
    state: Arc<RwLock<StreamState>>,
    handle: Option<JoinHandle<()>>,
}

/// Owns the single active log stream.
///
/// The worker runs on a dedicated thread, reads the producer's combined
/// output line by line and pushes each line into the shared [`LineQueue`].
pub struct LogStreamManager {
    program: String,
    launcher: Arc<dyn ProcessLauncher>,
    queue: LineQueue,
    session: Option<StreamSession>,
}

impl LogStreamManager {
    /// Create a manager that runs `program` (kubectl) through `launcher`
    pub fn new(
        program: impl Into<String>,
        launcher: Arc<dyn ProcessLauncher>,
        queue: LineQueue,
    ) -> Self {
        Self {
            program: program.into(),
            launcher,
            queue,
            session: None,
        }
    }

    /// Queue the worker feeds
    pub fn queue(&self) -> &LineQueue {
        &self.queue
    }

    /// Start streaming logs for `target`.
    ///
    /// Rejected while another session is starting or streaming.
    pub fn start(
        &mut self,
        target: StreamTarget,
        settings: StreamSettings,
    ) -> Result<(), StreamError> {
        if self.is_active() {
            return Err(StreamError::AlreadyActive);
        }
        // Reap the previous worker; it already reached a terminal state
        if let Some(mut previous) = self.session.take() {
            if let Some(handle) = previous.handle.take() {
                let _ = handle.join();
            }
        }

        let args = logs_args(&target, &settings);
        let cancel = CancellationToken::new();
        let process: ProcessSlot = Arc::new(Mutex::new(None));
        let state = Arc::new(RwLock::new(StreamState::Starting));

        let worker = StreamWorker {
            program: self.program.clone(),
            args,
            launcher: Arc::clone(&self.launcher),
            queue: self.queue.clone(),
            cancel: cancel.clone(),
            process: Arc::clone(&process),
            state: Arc::clone(&state),
        };

        let handle = std::thread::Builder::new()
            .name("log-stream".to_string())
            .spawn(move || worker.run())
            .map_err(|e| StreamError::Spawn(e.to_string()))?;

        info!(stream = %target.label(), ?settings, "log stream started");

        self.session = Some(StreamSession {
            target,
            cancel,
            process,
            state,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Stop the active stream.
    ///
    /// Sets the cancel flag and kills the producer right away, so a worker
    /// blocked on a read is released without waiting for another line.
    /// Returns false when nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        if !session.state.read().is_active() {
            return false;
        }

        session.cancel.cancel();
        if let Some(process) = session.process.lock().as_mut() {
            if let Err(e) = process.terminate() {
                warn!(error = %e, "failed to terminate log process");
            }
        }
        info!(stream = %session.target.label(), "log stream stop requested");
        true
    }

    /// Current lifecycle state; `Idle` before the first start
    pub fn state(&self) -> StreamState {
        self.session
            .as_ref()
            .map(|s| *s.state.read())
            .unwrap_or_default()
    }

    /// Whether a session is starting or streaming
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Target of the current (or last) session
    pub fn target(&self) -> Option<&StreamTarget> {
        self.session.as_ref().map(|s| &s.target)
    }

    /// Block until the worker finishes or `timeout` elapses.
    /// Returns true when no worker is left running.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let Some(session) = &mut self.session else {
            return true;
        };
        let Some(handle) = session.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                session.handle = Some(handle);
                return false;
            }
            std::thread::sleep(JOIN_POLL_INTERVAL);
        }
        let _ = handle.join();
        true
    }

    /// Stop any stream and give the worker `timeout` to finish
    pub fn shutdown(&mut self, timeout: Duration) {
        self.stop();
        if !self.wait(timeout) {
            warn!(?timeout, "log stream worker did not finish in time");
        }
    }
}

impl Drop for LogStreamManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the worker thread owns
struct StreamWorker {
    program: String,
    args: Vec<String>,
    launcher: Arc<dyn ProcessLauncher>,
    queue: LineQueue,
    cancel: CancellationToken,
    process: ProcessSlot,
    state: Arc<RwLock<StreamState>>,
}

impl StreamWorker {
    fn run(self) {
        let outcome = self.stream();
        info!(outcome = outcome.label(), "log stream finished");
        // The only terminal write; the UI derives start/stop enablement from it
        *self.state.write() = outcome;
    }

    fn stream(&self) -> StreamState {
        let mut process = match self.launcher.launch(&self.program, &self.args) {
            Ok(process) => process,
            Err(e) => {
                warn!(program = %self.program, error = %e, "failed to launch log process");
                self.queue.push(format!("Error: {}", e));
                return StreamState::Failed;
            }
        };

        let Some(output) = process.take_output() else {
            self.queue
                .push("Error: Failed to capture process output.".to_string());
            let _ = process.terminate();
            let _ = process.wait();
            return StreamState::Failed;
        };

        *self.process.lock() = Some(process);
        // A stop that landed before the process was published could not kill it
        if self.cancel.is_cancelled() {
            self.reap(true);
            return StreamState::Stopped;
        }
        {
            let mut state = self.state.write();
            if *state == StreamState::Starting {
                *state = StreamState::Streaming;
            }
        }

        let mut reader = BufReader::new(output);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    // The line that observes the flag is dropped
                    if self.cancel.is_cancelled() {
                        self.reap(true);
                        return StreamState::Stopped;
                    }
                    self.queue.push(decode_line(&buf));
                }
                Err(e) => {
                    warn!(error = %e, "failed reading log output");
                    self.queue.push(format!("Error: {}", e));
                    self.reap(true);
                    return StreamState::Failed;
                }
            }
        }

        if self.cancel.is_cancelled() {
            self.reap(true);
            return StreamState::Stopped;
        }
        // Follow mode often exits non-zero; the code is informational only
        self.reap(false);
        StreamState::Completed
    }

    /// Take the process out of the shared slot, optionally kill it, and reap it
    fn reap(&self, terminate: bool) {
        let Some(mut process) = self.process.lock().take() else {
            return;
        };
        if terminate {
            let _ = process.terminate();
        }
        match process.wait() {
            Ok(code) => debug!(?code, "log process exited"),
            Err(e) => warn!(error = %e, "failed to reap log process"),
        }
    }
}

/// Strip the line terminator and replace invalid UTF-8
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;

    use super::*;
    use crate::buffer::DisplayBuffer;

    /// Reader fed line by line from a channel; EOF once the sender is gone
    struct ChannelReader {
        rx: mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for ChannelReader {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                match self.rx.recv() {
                    Ok(chunk) => self.pending = chunk,
                    Err(_) => return Ok(0),
                }
            }
            let n = out.len().min(self.pending.len());
            out[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    /// Handle a test keeps to drive and inspect a fake process
    #[derive(Clone)]
    struct FakeHandle {
        tx: Arc<Mutex<Option<mpsc::Sender<Vec<u8>>>>>,
        terminated: Arc<AtomicBool>,
    }

    impl FakeHandle {
        fn emit(&self, line: &str) {
            if let Some(tx) = self.tx.lock().as_ref() {
                let _ = tx.send(format!("{}\n", line).into_bytes());
            }
        }

        fn close(&self) {
            self.tx.lock().take();
        }

        fn terminated(&self) -> bool {
            self.terminated.load(Ordering::SeqCst)
        }
    }

    /// Yields one line, then a read error
    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("boom"));
            }
            self.sent = true;
            out[..3].copy_from_slice(b"ok\n");
            Ok(3)
        }
    }

    struct FakeProcess {
        output: Option<Box<dyn Read + Send>>,
        handle: FakeHandle,
        exit_code: Option<i32>,
    }

    impl LogProcess for FakeProcess {
        fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
            self.output.take()
        }

        fn terminate(&mut self) -> io::Result<()> {
            self.handle.terminated.store(true, Ordering::SeqCst);
            // Killing the producer closes its output
            self.handle.close();
            Ok(())
        }

        fn wait(&mut self) -> io::Result<Option<i32>> {
            Ok(self.exit_code)
        }
    }

    enum Script {
        Channel,
        ExitCode(i32),
        ReadError,
        LaunchError,
        NoOutput,
    }

    struct FakeLauncher {
        script: Script,
        launches: AtomicUsize,
        handles: Mutex<Vec<FakeHandle>>,
        last_args: Mutex<Vec<String>>,
    }

    impl FakeLauncher {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                launches: AtomicUsize::new(0),
                handles: Mutex::new(Vec::new()),
                last_args: Mutex::new(Vec::new()),
            })
        }

        fn handle(&self) -> FakeHandle {
            self.handles.lock()[0].clone()
        }
    }

    impl ProcessLauncher for FakeLauncher {
        fn launch(&self, _program: &str, args: &[String]) -> io::Result<Box<dyn LogProcess>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock() = args.to_vec();
            let (tx, rx) = mpsc::channel();
            let handle = FakeHandle {
                tx: Arc::new(Mutex::new(Some(tx))),
                terminated: Arc::new(AtomicBool::new(false)),
            };
            self.handles.lock().push(handle.clone());
            let channel = Box::new(ChannelReader {
                rx,
                pending: Vec::new(),
            }) as Box<dyn Read + Send>;
            let (output, exit_code) = match self.script {
                Script::LaunchError => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        "kubectl: command not found",
                    ));
                }
                Script::NoOutput => (None, Some(0)),
                Script::Channel => (Some(channel), Some(0)),
                Script::ExitCode(code) => (Some(channel), Some(code)),
                Script::ReadError => (
                    Some(Box::new(FailingReader { sent: false }) as Box<dyn Read + Send>),
                    Some(0),
                ),
            };
            Ok(Box::new(FakeProcess {
                output,
                handle,
                exit_code,
            }))
        }
    }

    fn target() -> StreamTarget {
        StreamTarget {
            namespace: "dev".into(),
            pod: "api-0".into(),
            container: Some("app".into()),
        }
    }

    fn manager(launcher: &Arc<FakeLauncher>) -> LogStreamManager {
        LogStreamManager::new("kubectl", launcher.clone(), LineQueue::new())
    }

    fn wait_for_state(manager: &LogStreamManager, state: StreamState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.state() != state {
            assert!(Instant::now() < deadline, "timed out waiting for {:?}", state);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_lines_arrive_in_order() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);

        let handle = launcher.handle();
        for i in 1..=500 {
            handle.emit(&format!("line {}", i));
        }
        handle.close();

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Completed);

        let mut display = DisplayBuffer::new();
        display.drain_from(manager.queue());
        let expected: Vec<String> = (1..=500).map(|i| format!("line {}", i)).collect();
        assert_eq!(display.lines(), expected.as_slice());
    }

    #[test]
    fn test_stop_terminates_blocked_producer() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);

        // The producer never emits; only a direct kill can unblock the worker
        assert!(manager.stop());
        assert!(launcher.handle().terminated());

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Stopped);
        assert!(manager.queue().is_empty());
    }

    #[test]
    fn test_second_start_is_rejected() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();

        assert_eq!(
            manager.start(target(), StreamSettings::default()),
            Err(StreamError::AlreadyActive)
        );

        wait_for_state(&manager, StreamState::Streaming);
        manager.shutdown(Duration::from_secs(5));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_after_stop() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);
        manager.shutdown(Duration::from_secs(5));

        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
        manager.shutdown(Duration::from_secs(5));
    }

    #[test]
    fn test_launch_failure_reports_one_line() {
        let launcher = FakeLauncher::new(Script::LaunchError);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Failed);
        let lines = manager.queue().drain();
        assert_eq!(lines, vec!["Error: kubectl: command not found"]);
        assert!(!manager.is_active());
    }

    #[test]
    fn test_uncapturable_output_fails() {
        let launcher = FakeLauncher::new(Script::NoOutput);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Failed);
        assert_eq!(
            manager.queue().drain(),
            vec!["Error: Failed to capture process output."]
        );
    }

    #[test]
    fn test_read_error_mid_stream_fails_with_one_line() {
        let launcher = FakeLauncher::new(Script::ReadError);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Failed);
        assert_eq!(manager.queue().drain(), vec!["ok", "Error: boom"]);
        assert!(!manager.is_active());
    }

    #[test]
    fn test_nonzero_exit_still_completes() {
        let launcher = FakeLauncher::new(Script::ExitCode(1));
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);

        let handle = launcher.handle();
        handle.emit("last line");
        handle.close();

        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.state(), StreamState::Completed);
        assert_eq!(manager.queue().drain(), vec!["last line"]);
    }

    #[test]
    fn test_line_after_cancel_is_dropped() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        manager.start(target(), StreamSettings::default()).unwrap();
        wait_for_state(&manager, StreamState::Streaming);

        let handle = launcher.handle();
        handle.emit("kept");
        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.queue().is_empty() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }

        manager.stop();
        handle.emit("dropped");
        assert!(manager.wait(Duration::from_secs(5)));
        assert_eq!(manager.queue().drain(), vec!["kept"]);
    }

    #[test]
    fn test_arguments_follow_settings() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        let settings = StreamSettings {
            follow: false,
            tail: Some(20),
        };
        manager.start(target(), settings).unwrap();
        wait_for_state(&manager, StreamState::Streaming);
        launcher.handle().close();
        assert!(manager.wait(Duration::from_secs(5)));

        assert_eq!(
            *launcher.last_args.lock(),
            vec!["logs", "api-0", "-n", "dev", "--tail=20", "-c", "app"]
        );
    }

    #[test]
    fn test_stop_without_session() {
        let launcher = FakeLauncher::new(Script::Channel);
        let mut manager = manager(&launcher);
        assert!(!manager.stop());
        assert_eq!(manager.state(), StreamState::Idle);
        assert!(manager.wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{fffd} byte");
    }
}
