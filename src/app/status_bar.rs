use super::Screen;

/// Key hints shown in the footer
#[derive(Debug, Clone, Default)]
pub struct StatusBarState {
    pub left_hint: String,
    pub right_hint: String,
}

impl StatusBarState {
    pub fn categories() -> Self {
        Self {
            left_hint: "j/k: navigate  Enter: open  space: all".to_string(),
            right_hint: "i: install  r: remove  ?: help  q: quit".to_string(),
        }
    }

    pub fn items() -> Self {
        Self {
            left_hint: "j/k: navigate  space: toggle  a: all  Esc: back".to_string(),
            right_hint: "i: install  r: remove  R: reinstall  ?: help".to_string(),
        }
    }

    pub fn running() -> Self {
        Self {
            left_hint: "Working...".to_string(),
            right_hint: "Ctrl+C: cancel".to_string(),
        }
    }

    pub fn help() -> Self {
        Self {
            left_hint: String::new(),
            right_hint: "Esc/?: close".to_string(),
        }
    }

    pub fn for_screen(screen: Screen, running: bool) -> Self {
        if running {
            return Self::running();
        }
        match screen {
            Screen::Categories => Self::categories(),
            Screen::Items(_) => Self::items(),
        }
    }
}
