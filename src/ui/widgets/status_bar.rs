use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let state = if app.running { "RUNNING" } else { "IDLE" };

    let left = Line::from(vec![
        Span::raw(" "),
        Span::styled(format!(" {state} "), app.theme.state_style(app.running)),
        Span::raw(" "),
        Span::styled(app.status_bar.left_hint.as_str(), app.theme.muted_style()),
    ]);

    let dryrun_indicator = if app.dryrun {
        Span::styled(" [DRYRUN] ", app.theme.error_style())
    } else {
        Span::raw("")
    };
    let right = Line::from(vec![
        dryrun_indicator,
        Span::styled(app.status_bar.right_hint.as_str(), app.theme.muted_style()),
    ]);

    // Render left-aligned
    frame.render_widget(
        Paragraph::new(left).style(app.theme.style()),
        area,
    );

    // Render right-aligned
    let right_width = right.width() as u16;
    if area.width > right_width {
        let right_area = Rect {
            x: area.x + area.width - right_width - 1,
            y: area.y,
            width: right_width + 1,
            height: 1,
        };
        frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), right_area);
    }
}
