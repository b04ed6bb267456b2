use crate::app::{App, ItemRow, Screen};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

pub fn draw_catalog(frame: &mut Frame, area: Rect, app: &App) {
    let title = match (app.screen, app.current_category()) {
        (Screen::Items(_), Some(category)) => format!(" {} ", category.title),
        _ => " Catalog ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.pane_border_style(!app.running))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if inner.height < 3 {
        return;
    }

    // Top lines: progress and pending dependencies
    let mut header_lines = 0;
    if let Some(label) = &app.progress {
        frame.render_widget(
            Paragraph::new(format!("{} {label}", app.spinner_char()))
                .style(app.theme.title_style()),
            Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), 1),
        );
        header_lines += 1;
    }

    let pending = app.pending_dependencies();
    if !pending.is_empty() {
        frame.render_widget(
            Paragraph::new(format!("Dependencies: {}", pending.join(", ")))
                .style(app.theme.muted_style()),
            Rect::new(inner.x + 1, inner.y + header_lines, inner.width.saturating_sub(2), 1),
        );
        header_lines += 1;
    }
    if header_lines > 0 {
        header_lines += 1;
    }

    let list_area = Rect::new(
        inner.x,
        inner.y + header_lines,
        inner.width,
        inner.height.saturating_sub(header_lines),
    );

    match app.screen {
        Screen::Categories => draw_categories(frame, list_area, app),
        Screen::Items(idx) => {
            if let Some(category) = app.categories.get(idx) {
                draw_items(frame, list_area, app, &category.items);
            }
        }
    }
}

fn draw_categories(frame: &mut Frame, area: Rect, app: &App) {
    if app.categories.is_empty() {
        frame.render_widget(
            Paragraph::new("Catalog is empty").style(app.theme.muted_style()),
            Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), 1),
        );
        return;
    }

    for (idx, category) in app.categories.iter().enumerate() {
        if idx as u16 >= area.height {
            break;
        }

        let checkbox = if category.is_fully_selected() {
            "[x]"
        } else if category.selected_count() > 0 {
            "[~]"
        } else {
            "[ ]"
        };
        let counts = format!(
            "{}/{} installed",
            category.installed_count(),
            category.items.len()
        );
        let is_cursor = idx == app.category_cursor;

        let style = if is_cursor {
            app.theme.cursor_style()
        } else if category.selected_count() > 0 {
            app.theme.selected_style()
        } else {
            app.theme.style()
        };

        let line_area = Rect::new(area.x, area.y + idx as u16, area.width, 1);
        frame.render_widget(
            Paragraph::new(format!(" {checkbox} {}", category.title)).style(style),
            line_area,
        );
        frame.render_widget(
            Paragraph::new(format!("{counts} "))
                .style(if is_cursor { style } else { app.theme.muted_style() })
                .alignment(Alignment::Right),
            line_area,
        );
    }
}

fn draw_items(frame: &mut Frame, area: Rect, app: &App, items: &[ItemRow]) {
    // One line per item plus one for a description
    let visible = (area.height as usize / 2).max(1);
    let scroll = app.item_cursor.saturating_sub(visible - 1);

    let mut y = area.y;
    for (idx, item) in items.iter().enumerate().skip(scroll) {
        if y >= area.y + area.height {
            break;
        }

        let checkbox = if item.selected { "[x]" } else { "[ ]" };
        let marker = if app.failed.contains(&item.name) {
            Span::styled(" !", app.theme.error_style())
        } else if item.installed {
            Span::styled(" ✓", app.theme.installed_style())
        } else {
            Span::raw("")
        };
        let is_cursor = idx == app.item_cursor;

        let style = if is_cursor {
            app.theme.cursor_style()
        } else if item.selected {
            app.theme.selected_style()
        } else {
            app.theme.style()
        };

        let line = Line::from(vec![
            Span::styled(format!(" {checkbox} {}", item.name), style),
            marker,
            Span::styled(format!("  ({})", item.kind), app.theme.muted_style()),
        ]);
        frame.render_widget(Paragraph::new(line), Rect::new(area.x, y, area.width, 1));
        y += 1;

        if !item.description.is_empty() && y < area.y + area.height {
            frame.render_widget(
                Paragraph::new(format!("       {}", item.description)).style(app.theme.muted_style()),
                Rect::new(area.x, y, area.width, 1),
            );
            y += 1;
        }
    }
}
