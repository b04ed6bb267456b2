mod layout;
mod theme;
pub mod widgets;

pub use layout::Layout;
pub use theme::Theme;

use crate::app::App;
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::new(frame.area(), app.vertical_layout);

    widgets::draw_background(frame, layout.full, &app.theme);
    widgets::draw_header(frame, layout.header, app);
    widgets::draw_catalog(frame, layout.main, app);
    widgets::draw_log_panel(frame, layout.log, app);
    widgets::draw_message_panel(frame, layout.message, app);
    widgets::draw_status_bar(frame, layout.status, app);

    if app.show_help {
        widgets::draw_help(frame, layout.full);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, InstallKind, Item};
    use crate::config::GeneralConfig;
    use crate::installer::UiEvent;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_categories_log_and_progress() {
        let catalog = Catalog::from_items(
            "/tmp",
            vec![
                Item::new("ripgrep", "cli", InstallKind::Shell).with_installed(true),
                Item::new("slack", "apps", InstallKind::Shell),
            ],
        );
        let mut app = App::new(&GeneralConfig::default(), &catalog, true);
        app.apply(UiEvent::LogLine("$ brew install jq".to_string()));
        app.apply(UiEvent::ProgressLabelChanged(Some("Installing jq (1/1)".to_string())));

        let screen = rendered(&app);
        assert!(screen.contains("CLI Tools"));
        assert!(screen.contains("Desktop Apps"));
        assert!(screen.contains("1/1 installed"));
        assert!(screen.contains("$ brew install jq"));
        assert!(screen.contains("Installing jq (1/1)"));
        assert!(screen.contains("RUNNING"));
        assert!(screen.contains("[DRYRUN]"));
    }
}
