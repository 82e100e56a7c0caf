use ratatui::Frame;

use crate::app::{AppState, Field};
use crate::ui::Layout;
use crate::ui::components::{ListSelector, ListSelectorExt};

/// Popup for picking a namespace, pod or container
pub struct PickerScreen;

impl PickerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let Some(picker) = state.ui_state.picker.as_mut() else {
            return;
        };

        let selection = state.selection.selection();
        let current = match picker.field {
            Field::Namespace => Some(selection.namespace()),
            Field::Pod => selection.pod(),
            Field::Container => selection.container(),
            _ => None,
        };

        let height = (picker.items.len() as u16).saturating_add(2).min(20);
        let area = Layout::popup(frame.area(), 50, height.max(3));

        let selector = ListSelector::new(format!("Select {}", picker.field.label()))
            .items(
                picker
                    .items
                    .iter()
                    .map(|item| (item.as_str(), Some(item.as_str()) == current)),
            );

        frame.render_list_selector(area, selector, &mut picker.list_state);
    }
}
