use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,
    pub info: Color,
    pub background: Color,
    pub foreground: Color,
    pub error: Color,
    pub installed: Color,
    pub border: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Yellow,
            info: Color::Cyan,
            background: Color::Reset,
            foreground: Color::White,
            error: Color::Red,
            installed: Color::Green,
            border: Color::DarkGray,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Row under the cursor
    pub fn cursor_style(&self) -> Style {
        self.title_style().add_modifier(Modifier::REVERSED)
    }

    pub fn selected_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn installed_style(&self) -> Style {
        Style::default().fg(self.installed)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// Panes take input only while idle
    pub fn pane_border_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Badge on the left of the status bar
    pub fn state_style(&self, running: bool) -> Style {
        let color = if running { self.accent } else { self.info };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Log lines: commands, warnings and errors stand out
    pub fn log_line_style(&self, line: &str) -> Style {
        if line.starts_with("error:") {
            self.error_style()
        } else if line.starts_with("warning:") {
            Style::default().fg(self.accent)
        } else if line.starts_with("$ ") {
            self.info_style()
        } else {
            self.style()
        }
    }
}
