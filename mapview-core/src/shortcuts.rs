//! Keyboard shortcuts.

use crate::session::Controls;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleHelp,
    Close(Closable),
    ZoomIn,
    ZoomOut,
    ToggleSidebar,
    ToggleTheme,
    ToggleMeasure,
    ToggleMarkers,
    ToggleFilters,
    FocusSearch,
}

/// Things Escape can dismiss, in the order it tries them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Closable {
    HelpModal,
    Popup,
    FilterPanel,
    SearchResults,
    Measurement,
}

/// What is open on screen when a key arrives.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiState {
    pub typing: bool,
    pub help_open: bool,
    pub popup_open: bool,
    pub filters_open: bool,
    pub search_results_open: bool,
    pub measuring: bool,
    pub controls: Controls,
}

#[derive(Clone, Copy, Debug)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    /// Ctrl on most platforms, Cmd on macOS.
    pub command: bool,
}

fn escape_target(ui: &UiState) -> Option<Closable> {
    [
        (ui.help_open, Closable::HelpModal),
        (ui.popup_open, Closable::Popup),
        (ui.filters_open, Closable::FilterPanel),
        (ui.search_results_open, Closable::SearchResults),
        (ui.measuring, Closable::Measurement),
    ]
    .into_iter()
    .find_map(|(open, what)| open.then_some(what))
}

pub fn command_for(press: KeyPress<'_>, ui: &UiState) -> Option<Command> {
    if press.key == "Escape" {
        return escape_target(ui).map(Command::Close);
    }
    if ui.typing {
        return None;
    }
    if press.key == "?" {
        return Some(Command::ToggleHelp);
    }
    if ui.help_open {
        return None;
    }
    let key = press.key.to_lowercase();
    if press.command {
        return (key == "f" && ui.controls.search).then_some(Command::FocusSearch);
    }
    let cmd = match key.as_str() {
        "+" | "=" => Command::ZoomIn,
        "-" => Command::ZoomOut,
        "s" => Command::ToggleSidebar,
        "t" => Command::ToggleTheme,
        "m" if ui.controls.measure => Command::ToggleMeasure,
        "h" if ui.controls.markers_toggle => Command::ToggleMarkers,
        "f" if ui.controls.filters => Command::ToggleFilters,
        "/" if ui.controls.search => Command::FocusSearch,
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: &str) -> KeyPress<'_> {
        KeyPress { key, command: false }
    }

    #[test]
    fn escape_closes_in_order() {
        let mut ui = UiState {
            popup_open: true,
            filters_open: true,
            measuring: true,
            ..Default::default()
        };
        assert_eq!(command_for(press("Escape"), &ui), Some(Command::Close(Closable::Popup)));
        ui.popup_open = false;
        assert_eq!(
            command_for(press("Escape"), &ui),
            Some(Command::Close(Closable::FilterPanel))
        );
        ui.filters_open = false;
        assert_eq!(
            command_for(press("Escape"), &ui),
            Some(Command::Close(Closable::Measurement))
        );
        assert_eq!(command_for(press("Escape"), &UiState::default()), None);
    }

    #[test]
    fn typing_suppresses_shortcuts() {
        let ui = UiState {
            typing: true,
            ..Default::default()
        };
        assert_eq!(command_for(press("s"), &ui), None);
        assert_eq!(command_for(press("?"), &ui), None);
    }

    #[test]
    fn map_shortcuts_need_their_control() {
        let mut ui = UiState::default();
        assert_eq!(command_for(press("m"), &ui), None);
        assert_eq!(command_for(press("="), &ui), Some(Command::ZoomIn));
        ui.controls.measure = true;
        ui.controls.search = true;
        assert_eq!(command_for(press("M"), &ui), Some(Command::ToggleMeasure));
        let ctrl_f = KeyPress {
            key: "f",
            command: true,
        };
        assert_eq!(command_for(ctrl_f, &ui), Some(Command::FocusSearch));
        ui.help_open = true;
        assert_eq!(command_for(press("t"), &ui), None);
        assert_eq!(command_for(press("?"), &ui), Some(Command::ToggleHelp));
    }
}
