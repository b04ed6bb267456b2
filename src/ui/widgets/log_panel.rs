use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

pub fn draw_log_panel(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.log_scroll.is_following() {
        " Log ".to_string()
    } else {
        " Log (scrolled, End: follow) ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.pane_border_style(false))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    let offset = app.log_scroll.offset(app.log.len(), height);

    let lines: Vec<Line> = app
        .log
        .window(offset, height)
        .iter()
        .map(|line| Line::styled(line.as_str(), app.theme.log_line_style(line)))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
