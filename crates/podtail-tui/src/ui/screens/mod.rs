mod picker;
mod viewer;

pub use picker::PickerScreen;
pub use viewer::ViewerScreen;
