use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

pub struct Layout {
    pub full: Rect,
    pub header: Rect,
    pub main: Rect,
    pub log: Rect,
    pub message: Rect,
    pub status: Rect,
}

impl Layout {
    /// `vertical` puts the log pane under the main pane instead of beside it
    pub fn new(area: Rect, vertical: bool) -> Self {
        // Message panel space is always reserved so the panes don't jump
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(8),    // Panes
                Constraint::Length(3), // Message panel
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let (direction, split) = if vertical {
            (Direction::Vertical, [Constraint::Percentage(55), Constraint::Percentage(45)])
        } else {
            (Direction::Horizontal, [Constraint::Percentage(45), Constraint::Percentage(55)])
        };
        let panes = RatatuiLayout::default()
            .direction(direction)
            .constraints(split)
            .split(chunks[1]);

        Self {
            full: area,
            header: chunks[0],
            main: panes[0],
            log: panes[1],
            message: chunks[2],
            status: chunks[3],
        }
    }

    pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
        let horizontal = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(width),
                Constraint::Fill(1),
            ])
            .split(area);

        let vertical = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(height),
                Constraint::Fill(1),
            ])
            .split(horizontal[1]);

        vertical[1]
    }
}
