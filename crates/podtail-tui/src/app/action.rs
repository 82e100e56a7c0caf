/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // Focus
    FocusNext,
    FocusPrev,
    Activate,

    // Streaming
    StartStream,
    StopStream,
    ClearLogs,

    // Discovery
    RefreshNamespaces,

    // Picker popup
    PickerUp,
    PickerDown,
    PickerSelect,
    PickerClose,

    // Tail count input
    TailInput(char),
    TailBackspace,
    TailDone,

    ToggleFollow,

    // Log view scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,

    ToggleHelp,

    // Error dialog
    DismissError,

    // Render request
    Render,
}
