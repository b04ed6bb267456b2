use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let left = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{} (v{})", app.title, env!("CARGO_PKG_VERSION")),
            app.theme.title_style(),
        ),
    ]));
    frame.render_widget(left, area);

    let installed: usize = app.categories.iter().map(|c| c.installed_count()).sum();
    let total: usize = app.categories.iter().map(|c| c.items.len()).sum();
    let selected: usize = app.categories.iter().map(|c| c.selected_count()).sum();

    let right = Paragraph::new(Line::from(vec![
        Span::styled(format!("{selected} selected"), app.theme.selected_style()),
        Span::raw("  "),
        Span::styled(format!("{installed}/{total} installed"), app.theme.muted_style()),
        Span::raw(" "),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(right, area);
}
