use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Char, Down, Tab, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    match key.code {
        Up | Char('k') => app.select_previous(),
        Down | Char('j') => app.select_next(),
        Tab | BackTab => app.toggle_focus(),
        Char('c') => app.clear_alerts(),
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Pane;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quits_on_q_and_ctrl_c() {
        let mut app = App::new(String::new());
        assert_eq!(handle_key_event(press(KeyCode::Char('q')), &mut app), Action::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c, &mut app), Action::Quit);
    }

    #[test]
    fn tab_switches_focus() {
        let mut app = App::new(String::new());
        assert_eq!(handle_key_event(press(KeyCode::Tab), &mut app), Action::None);
        assert_eq!(app.focus, Pane::Alerts);
    }
}
