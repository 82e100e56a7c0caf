mod config;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use podtail_kubectl::Kubectl;
use podtail_logs::{LineQueue, LogStreamManager, SystemLauncher};
use podtail_tui::{
    Action, AppState, ErrorDialog, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    PickerScreen, SelectionController, Tui, ViewerScreen,
};

use config::Settings;

/// How long quit waits for the log stream worker
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Podtail - browse pods and stream their logs through kubectl
#[derive(Parser, Debug)]
#[command(name = "podtail")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Namespace to select on startup (falls back to the first one found)
    #[arg(value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// kubectl executable to run
    #[arg(long, value_name = "PATH")]
    pub kubectl: Option<String>,

    /// Number of historical log lines to fetch
    #[arg(long, value_name = "N", conflicts_with = "no_tail")]
    pub tail: Option<u64>,

    /// Fetch the whole log history
    #[arg(long)]
    pub no_tail: bool,

    /// Print existing logs and stop instead of following
    #[arg(long)]
    pub no_follow: bool,

    /// UI tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_rate: Option<u64>,

    /// Config file (default: $PODTAIL_CONFIG or ~/.config/podtail/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write diagnostics to this file (default: $XDG_STATE_HOME/podtail/podtail.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args)?;

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = log_filter(&std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default());

    // stderr is the terminal the UI draws on, so diagnostics go to a file
    let file = match &args.log_file {
        Some(path) => Some(
            open_log(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?,
        ),
        None => default_log_path(std::env::var("XDG_STATE_HOME").ok(), std::env::var("HOME").ok())
            .and_then(|path| open_log(&path).ok()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);
    match file {
        Some(file) => builder.with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(io::sink).init(),
    }
    Ok(())
}

/// WARN unless `RUST_LOG` says otherwise
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn default_log_path(state_home: Option<String>, home: Option<String>) -> Option<PathBuf> {
    let base = state_home
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| PathBuf::from(home).join(".local/state")))?;
    Some(base.join("podtail").join("podtail.log"))
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

async fn run_app(args: Args) -> Result<()> {
    let settings = Settings::load(&args)?;
    info!(?settings, "starting podtail");

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // kubectl facade for discovery, stream manager for `kubectl logs`
    let kubectl = Kubectl::new(settings.kubectl.clone());
    let streams = LogStreamManager::new(
        settings.kubectl.clone(),
        Arc::new(SystemLauncher),
        LineQueue::new(),
    );

    let mut state = AppState::new(
        SelectionController::new(settings.namespace.clone()),
        streams,
        settings.stream,
    );
    state.refresh_namespaces();

    let mut tui = Tui::new().context("failed to set up the terminal")?;
    let mut events = EventHandler::new(settings.tick_rate);
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = match key_context(&state) {
                            Some(context) => keybindings.get_action(context, &key),
                            None => keybindings.get_tail_input_action(&key),
                        };
                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        // Discovery shells out to kubectl and blocks until it exits
                        tokio::task::block_in_place(|| state.on_tick(&kubectl));
                    }
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, action);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state)?;
    }

    // Cleanup
    tokio::task::block_in_place(|| state.streams.shutdown(SHUTDOWN_TIMEOUT));
    events.shutdown().await;
    tui.restore()?;

    Ok(())
}

/// Keybinding context for the topmost layer; `None` while editing the tail
fn key_context(state: &AppState) -> Option<KeyContext> {
    let ui = &state.ui_state;
    if ui.error_message.is_some() {
        Some(KeyContext::Dialog)
    } else if ui.help_visible {
        Some(KeyContext::Help)
    } else if ui.picker.is_some() {
        Some(KeyContext::Picker)
    } else if ui.tail_editing {
        None
    } else {
        Some(KeyContext::Main)
    }
}

fn handle_action(state: &mut AppState, action: Action) {
    debug!(?action, "handling action");
    match action {
        Action::Quit => {
            state.should_quit = true;
        }

        // Header focus
        Action::FocusNext => {
            state.ui_state.focus = state.ui_state.focus.next();
        }
        Action::FocusPrev => {
            state.ui_state.focus = state.ui_state.focus.prev();
        }
        Action::Activate => {
            state.activate();
        }

        // Streaming
        Action::StartStream => {
            state.start_stream();
        }
        Action::StopStream => {
            state.stop_stream();
        }
        Action::ClearLogs => {
            state.clear_logs();
        }
        Action::RefreshNamespaces => {
            state.refresh_namespaces();
        }

        // Picker popup
        Action::PickerUp => {
            if let Some(picker) = state.ui_state.picker.as_mut() {
                picker.up();
            }
        }
        Action::PickerDown => {
            if let Some(picker) = state.ui_state.picker.as_mut() {
                picker.down();
            }
        }
        Action::PickerSelect => {
            state.picker_select();
        }
        Action::PickerClose => {
            state.ui_state.picker = None;
        }

        // Tail input
        Action::TailInput(c) => {
            state.tail_input_char(c);
        }
        Action::TailBackspace => {
            state.tail_input_backspace();
        }
        Action::TailDone => {
            state.ui_state.tail_editing = false;
        }
        Action::ToggleFollow => {
            state.toggle_follow();
        }

        // Log view
        Action::ScrollUp(n) => {
            state.display.scroll_up(n);
        }
        Action::ScrollDown(n) => {
            state.display.scroll_down(n);
        }
        Action::PageUp => {
            state.display.page_up();
        }
        Action::PageDown => {
            state.display.page_down();
        }
        Action::ScrollToTop => {
            state.display.scroll_to_top();
        }
        Action::ScrollToBottom => {
            state.display.scroll_to_bottom();
        }

        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::DismissError => {
            state.dismiss_error();
        }
        Action::Render => {
            // Just trigger a re-render
        }
    }
}

fn render(tui: &mut Tui, state: &mut AppState) -> Result<()> {
    tui.terminal().draw(|frame| {
        ViewerScreen::render(frame, state);

        if state.ui_state.picker.is_some() {
            PickerScreen::render(frame, state);
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if let Some(message) = &state.ui_state.error_message {
            ErrorDialog::render(frame, message);
        }
    })?;

    Ok(())
}
