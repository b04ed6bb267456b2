//! View state for the terminal front end.
//!
//! [`App`] mirrors what the installer publishes through [`UiEvent`]s and
//! turns key presses into [`AppAction`]s. It never touches installer state
//! itself; the event loop forwards actions to the orchestrator.

mod scroll;
mod status_bar;

pub use scroll::LogScroll;
pub use status_bar::StatusBarState;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;

use crate::catalog::{Catalog, Category, Item};
use crate::config::GeneralConfig;
use crate::installer::{LogStream, UiEvent};
use crate::ui::Theme;

const PAGE: usize = 10;

/// Requests for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Toggle(String),
    SelectAll(String),
    Install,
    Remove,
    Reinstall,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Categories,
    /// Items of the category at this index
    Items(usize),
}

/// Message displayed above the footer
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub struct ItemRow {
    pub name: String,
    pub description: String,
    pub kind: &'static str,
    pub depends: Vec<String>,
    pub installed: bool,
    pub selected: bool,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            kind: item.kind.label(),
            depends: item.depends.clone(),
            installed: item.is_installed(),
            selected: item.is_selected(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub key: String,
    pub title: String,
    pub items: Vec<ItemRow>,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            key: category.key.clone(),
            title: category.display_name().to_string(),
            items: category.items.iter().map(ItemRow::from).collect(),
        }
    }
}

impl CategoryRow {
    pub fn installed_count(&self) -> usize {
        self.items.iter().filter(|i| i.installed).count()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    pub fn is_fully_selected(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.selected)
    }
}

pub struct App {
    pub title: String,
    pub theme: Theme,
    pub dryrun: bool,
    pub categories: Vec<CategoryRow>,
    pub screen: Screen,
    pub category_cursor: usize,
    pub item_cursor: usize,
    pub vertical_layout: bool,
    pub log: LogStream,
    pub log_scroll: LogScroll,
    pub progress: Option<String>,
    /// Items whose last operation failed
    pub failed: BTreeSet<String>,
    pub message: Option<Message>,
    pub show_help: bool,
    pub running: bool,
    pub status_bar: StatusBarState,
    pub should_exit: bool,
    spinner_frame: usize,
}

impl App {
    pub fn new(config: &GeneralConfig, catalog: &Catalog, dryrun: bool) -> Self {
        Self {
            title: config.title.clone(),
            theme: Theme::default(),
            dryrun,
            categories: catalog.categories().iter().map(CategoryRow::from).collect(),
            screen: Screen::Categories,
            category_cursor: 0,
            item_cursor: 0,
            vertical_layout: config.vertical_layout,
            log: LogStream::new(),
            log_scroll: LogScroll::default(),
            progress: None,
            failed: BTreeSet::new(),
            message: None,
            show_help: false,
            running: false,
            status_bar: StatusBarState::categories(),
            should_exit: false,
            spinner_frame: 0,
        }
    }

    pub fn current_category(&self) -> Option<&CategoryRow> {
        match self.screen {
            Screen::Categories => self.categories.get(self.category_cursor),
            Screen::Items(idx) => self.categories.get(idx),
        }
    }

    pub fn current_item(&self) -> Option<&ItemRow> {
        match self.screen {
            Screen::Categories => None,
            Screen::Items(idx) => self.categories.get(idx)?.items.get(self.item_cursor),
        }
    }

    fn find_item(&self, name: &str) -> Option<&ItemRow> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .find(|i| i.name == name)
    }

    /// Dependencies of selected items that still need installing
    pub fn pending_dependencies(&self) -> Vec<String> {
        let mut pending = BTreeSet::new();
        for item in self.categories.iter().flat_map(|c| c.items.iter()) {
            if !item.selected {
                continue;
            }
            for dep in &item.depends {
                if !self.find_item(dep).is_some_and(|d| d.installed) {
                    pending.insert(dep.clone());
                }
            }
        }
        pending.into_iter().collect()
    }

    /// Mirror one installer event
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::LogLine(line) => {
                self.log.append(line);
                self.log_scroll.line_added();
            }
            UiEvent::OperationCompleted { name, success, .. } => {
                if success {
                    self.failed.remove(&name);
                } else {
                    self.failed.insert(name);
                }
            }
            UiEvent::ProgressLabelChanged(label) => {
                self.running = label.is_some();
                self.progress = label;
            }
            UiEvent::ItemStateChanged {
                name,
                installed,
                selected,
            } => {
                if let Some(row) = self
                    .categories
                    .iter_mut()
                    .flat_map(|c| c.items.iter_mut())
                    .find(|i| i.name == name)
                {
                    row.installed = installed;
                    row.selected = selected;
                }
            }
            UiEvent::BatchFinished {
                action,
                succeeded,
                failed,
            } => {
                self.running = false;
                let text = format!(
                    "{} finished: {succeeded} succeeded, {failed} failed",
                    action.display_name()
                );
                self.set_message(text, failed > 0);
            }
        }
        self.update_status_bar();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');

        if self.running {
            return ctrl_c.then_some(AppAction::Cancel);
        }

        if ctrl_c {
            self.should_exit = true;
            return None;
        }

        self.message = None;

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
                self.update_status_bar();
            }
            return None;
        }

        let action = match key.code {
            KeyCode::Char('q') => {
                self.should_exit = true;
                None
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.navigate_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.navigate_up();
                None
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.open_category();
                None
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => {
                self.screen = Screen::Categories;
                None
            }
            KeyCode::Char(' ') => match self.screen {
                Screen::Categories => self.current_category().map(|c| AppAction::SelectAll(c.key.clone())),
                Screen::Items(_) => self.current_item().map(|i| AppAction::Toggle(i.name.clone())),
            },
            KeyCode::Char('a') => self.current_category().map(|c| AppAction::SelectAll(c.key.clone())),
            KeyCode::Char('i') => Some(AppAction::Install),
            KeyCode::Char('r') => Some(AppAction::Remove),
            KeyCode::Char('R') => Some(AppAction::Reinstall),
            KeyCode::Tab => {
                self.vertical_layout = !self.vertical_layout;
                None
            }
            KeyCode::PageUp => {
                self.log_scroll.scroll_up(PAGE, self.log.len());
                None
            }
            KeyCode::PageDown => {
                self.log_scroll.scroll_down(PAGE);
                None
            }
            KeyCode::End => {
                self.log_scroll.follow();
                None
            }
            _ => None,
        };

        self.update_status_bar();
        action
    }

    /// Called when the orchestrator refused a request
    pub fn nothing_to_do(&mut self, action: &AppAction) {
        let text = match action {
            AppAction::Install => "Nothing selected to install",
            AppAction::Remove => "No installed items selected to remove",
            AppAction::Reinstall => "No installed items selected to reinstall",
            _ => return,
        };
        self.set_message(text.to_string(), false);
    }

    fn navigate_down(&mut self) {
        match self.screen {
            Screen::Categories => {
                if self.category_cursor + 1 < self.categories.len() {
                    self.category_cursor += 1;
                }
            }
            Screen::Items(idx) => {
                let len = self.categories.get(idx).map_or(0, |c| c.items.len());
                if self.item_cursor + 1 < len {
                    self.item_cursor += 1;
                }
            }
        }
    }

    fn navigate_up(&mut self) {
        match self.screen {
            Screen::Categories => self.category_cursor = self.category_cursor.saturating_sub(1),
            Screen::Items(_) => self.item_cursor = self.item_cursor.saturating_sub(1),
        }
    }

    fn open_category(&mut self) {
        if self.screen == Screen::Categories && self.category_cursor < self.categories.len() {
            self.screen = Screen::Items(self.category_cursor);
            self.item_cursor = 0;
        }
    }

    pub fn set_message(&mut self, text: String, is_error: bool) {
        self.message = Some(Message { text, is_error });
    }

    pub fn update_status_bar(&mut self) {
        self.status_bar = if self.show_help && !self.running {
            StatusBarState::help()
        } else {
            StatusBarState::for_screen(self.screen, self.running)
        };
    }

    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 4;
    }

    pub fn spinner_char(&self) -> char {
        const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
        SPINNER[self.spinner_frame]
    }
}
