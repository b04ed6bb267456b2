use crate::ui::Layout;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

pub fn draw_help(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled("Navigation", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  j/k      Move down/up"),
        Line::from("  Enter/l  Open category"),
        Line::from("  Esc/h    Back to categories"),
        Line::from(""),
        Line::from(Span::styled("Selection", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  space    Toggle item (whole category on list)"),
        Line::from("  a        Select all / none in category"),
        Line::from(""),
        Line::from(Span::styled("Actions", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  i        Install selected"),
        Line::from("  r        Remove selected"),
        Line::from("  R        Reinstall selected"),
        Line::from("  Ctrl+C   Cancel running batch"),
        Line::from(""),
        Line::from(Span::styled("View", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Tab      Toggle layout"),
        Line::from("  PgUp/Dn  Scroll log"),
        Line::from("  End      Follow log"),
        Line::from("  q        Quit"),
        Line::from(""),
        Line::from(Span::styled("Press Escape to close", Style::default().fg(Color::DarkGray))),
    ];

    let height = help_text.len() as u16 + 2;
    let width = 50u16.min(area.width.saturating_sub(4));
    let help_area = Layout::centered_box(area, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Help ")
        .title_style(Style::default().fg(Color::Yellow));

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Paragraph::new(help_text).block(block),
        help_area,
    );
}
