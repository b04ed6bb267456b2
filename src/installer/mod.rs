//! Selection state and the install/remove/reinstall state machine.
//!
//! The [`Orchestrator`] is owned by the event loop. Operations run on
//! spawned tasks that report back over an [`InstallerMessage`] channel; the
//! loop feeds each message to [`Orchestrator::handle_message`], which is the
//! only place that advances a batch. Everything the view needs is published
//! as [`UiEvent`]s.

mod deps;
mod hook;
mod log;
mod message;
mod queue;

pub use deps::DependencyTracker;
pub use hook::{PostInstall, ShellIntegration};
pub use log::LogStream;
pub use message::{InstallerMessage, LogSink, UiEvent};
pub use queue::{build_install_batch, build_reinstall_batch, build_remove_batch, Batch, Operation};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backend::{cancel_pair, Action, Backend, Job};
use crate::catalog::Catalog;
use crate::error::BootsError;

#[derive(Debug, Default)]
enum Mode {
    #[default]
    Idle,
    Running(Batch),
}

pub struct Orchestrator {
    catalog: Catalog,
    deps: DependencyTracker,
    log: LogStream,
    mode: Mode,
    progress: Option<String>,
    backend: Arc<dyn Backend>,
    hook: Option<Arc<ShellIntegration>>,
    messages: mpsc::UnboundedSender<InstallerMessage>,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl Orchestrator {
    pub fn new(
        catalog: Catalog,
        backend: Arc<dyn Backend>,
        messages: mpsc::UnboundedSender<InstallerMessage>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            catalog,
            deps: DependencyTracker::new(),
            log: LogStream::new(),
            mode: Mode::Idle,
            progress: None,
            backend,
            hook: None,
            messages,
            events,
        }
    }

    /// Run shell integration after every successful install
    pub fn with_hook(mut self, hook: ShellIntegration) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn dependencies(&self) -> &DependencyTracker {
        &self.deps
    }

    pub fn log(&self) -> &LogStream {
        &self.log
    }

    pub fn progress_label(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.mode, Mode::Running(_))
    }

    pub fn running_action(&self) -> Option<Action> {
        match &self.mode {
            Mode::Running(batch) => Some(batch.action()),
            Mode::Idle => None,
        }
    }

    /// Flip one item's selection. Returns false when nothing changed.
    pub fn toggle_selection(&mut self, name: &str) -> bool {
        if self.is_running() {
            return false;
        }
        match self.catalog.lookup(name) {
            Some(item) => {
                let selected = !item.selected;
                self.set_selected(name, selected)
            }
            None => false,
        }
    }

    /// Select everything in a category, or deselect it all if it already is
    pub fn select_all(&mut self, category: &str) -> bool {
        if self.is_running() {
            return false;
        }
        let Some(category) = self.catalog.category(category) else {
            return false;
        };
        if category.items.is_empty() {
            return false;
        }

        let all_selected = category.items.iter().all(|i| i.selected);
        let names: Vec<String> = category
            .items
            .iter()
            .filter(|i| i.selected == all_selected)
            .map(|i| i.name.clone())
            .collect();

        for name in names {
            self.set_selected(&name, !all_selected);
        }
        true
    }

    /// Returns false when there was nothing to install
    pub fn request_install(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        let unknown: Vec<String> = self
            .deps
            .names()
            .filter(|dep| self.catalog.lookup(dep).is_none())
            .map(str::to_string)
            .collect();

        let operations = build_install_batch(&self.catalog, &self.deps);
        if !operations.is_empty() {
            for dep in unknown {
                warn!("Dependency {} is not in the catalog", dep);
                self.append_log(format!("warning: dependency {dep} is not in the catalog, skipping"));
            }
        }
        self.start_batch(Action::Install, operations)
    }

    pub fn request_remove(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let operations = build_remove_batch(&self.catalog);
        self.start_batch(Action::Remove, operations)
    }

    pub fn request_reinstall(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let operations = build_reinstall_batch(&self.catalog);
        self.start_batch(Action::Reinstall, operations)
    }

    /// Stop the running batch after the in-flight operation. Returns false
    /// when idle or already cancelling.
    pub fn cancel(&mut self) -> bool {
        let Mode::Running(batch) = &mut self.mode else {
            return false;
        };
        if batch.is_cancelled() {
            return false;
        }
        batch.cancel();
        let action = batch.action();

        info!("{} batch cancelled", action.display_name());
        self.append_log(format!("Cancelling {}...", action.display_name().to_lowercase()));
        true
    }

    pub fn handle_message(&mut self, message: InstallerMessage) {
        match message {
            InstallerMessage::LogLine(line) => self.append_log(line),
            InstallerMessage::OperationCompleted {
                name,
                action,
                success,
            } => self.complete_operation(name, action, success),
        }
    }

    fn complete_operation(&mut self, name: String, action: Action, success: bool) {
        let Mode::Running(batch) = &mut self.mode else {
            warn!("Completion for {} arrived while idle", name);
            return;
        };
        if batch.current().map(|op| op.name.as_str()) != Some(name.as_str()) {
            warn!("Completion for {} does not match the running operation", name);
            return;
        }

        batch.record(success);
        let skipped = if batch.is_cancelled() {
            batch.remaining()
        } else {
            0
        };
        let next = if batch.is_cancelled() {
            None
        } else {
            batch.advance().cloned()
        };
        let label = batch.label();

        if let Some(item) = self.catalog.lookup_mut(&name) {
            match action {
                Action::Install | Action::Reinstall => item.installed = success,
                Action::Remove => {
                    if success {
                        item.installed = false;
                    }
                }
            }
            item.selected = false;
            let installed = item.installed;
            self.emit(UiEvent::ItemStateChanged {
                name: name.clone(),
                installed,
                selected: false,
            });
        }

        if success {
            info!("{} {} succeeded", action.display_name(), name);
        } else {
            warn!("{} {} failed", action.display_name(), name);
        }
        self.emit(UiEvent::OperationCompleted {
            name,
            action,
            success,
        });

        match next {
            Some(operation) => {
                self.set_progress(Some(label));
                self.dispatch(&operation);
            }
            None => {
                if skipped > 0 {
                    self.append_log(format!("Cancelled: {skipped} operation(s) skipped"));
                }
                self.finish_batch();
            }
        }
    }

    fn start_batch(&mut self, action: Action, operations: Vec<Operation>) -> bool {
        if operations.is_empty() {
            debug!("Nothing to {}", action.display_name().to_lowercase());
            return false;
        }

        let batch = Batch::new(action, operations, cancel_pair());
        let Some(first) = batch.current().cloned() else {
            return false;
        };
        let label = batch.label();
        let total = batch.len();
        self.mode = Mode::Running(batch);

        info!("{} batch started with {} operation(s)", action.display_name(), total);
        self.set_progress(Some(label));
        self.dispatch(&first);
        true
    }

    /// Spawn one operation. Its completion message is sent only after every
    /// log line it produced, post-install output included.
    fn dispatch(&self, operation: &Operation) {
        let Mode::Running(batch) = &self.mode else {
            return;
        };
        let mut cancel = batch.signal();
        let tx = self.messages.clone();
        let action = operation.action;
        let name = operation.name.clone();

        let Some(item) = self.catalog.lookup(&name) else {
            warn!("{} vanished from the catalog", name);
            let _ = tx.send(InstallerMessage::OperationCompleted {
                name,
                action,
                success: false,
            });
            return;
        };

        let job = Job::from(item);
        let post_install = match (&self.hook, action) {
            (Some(hook), Action::Install) => {
                Some((Arc::clone(hook), PostInstall::for_item(&self.catalog, item)))
            }
            _ => None,
        };
        let backend = Arc::clone(&self.backend);
        let log = LogSink::new(tx.clone());

        debug!("Dispatching {} {}", action.display_name(), name);
        tokio::spawn(async move {
            let result = backend.execute(action, job, log.clone(), cancel.clone()).await;
            let success = match result {
                Ok(()) => true,
                Err(BootsError::Cancelled) => {
                    log.line(format!("{name}: cancelled"));
                    false
                }
                Err(e) => {
                    log.line(format!("error: {name}: {e}"));
                    false
                }
            };

            if success {
                if let Some((hook, post_install)) = post_install {
                    if let Err(e) = hook.configure(&post_install, &log, &mut cancel).await {
                        warn!("Post-install for {} failed: {}", name, e);
                    }
                }
            }

            let _ = tx.send(InstallerMessage::OperationCompleted {
                name,
                action,
                success,
            });
        });
    }

    fn finish_batch(&mut self) {
        let Mode::Running(batch) = std::mem::take(&mut self.mode) else {
            return;
        };

        self.set_progress(None);
        self.deps.clear();

        let mut cleared = Vec::new();
        for item in self.catalog.items_mut().filter(|i| i.selected) {
            item.selected = false;
            cleared.push((item.name.clone(), item.installed));
        }
        for (name, installed) in cleared {
            self.emit(UiEvent::ItemStateChanged {
                name,
                installed,
                selected: false,
            });
        }

        let action = batch.action();
        let (succeeded, failed) = (batch.succeeded(), batch.failed());
        info!(
            "{} batch finished: {} succeeded, {} failed",
            action.display_name(),
            succeeded,
            failed
        );
        self.append_log(format!(
            "{} finished: {succeeded} succeeded, {failed} failed",
            action.display_name()
        ));
        self.emit(UiEvent::BatchFinished {
            action,
            succeeded,
            failed,
        });
    }

    fn set_selected(&mut self, name: &str, selected: bool) -> bool {
        let Some(item) = self.catalog.lookup_mut(name) else {
            return false;
        };
        if item.selected == selected {
            return false;
        }

        item.selected = selected;
        if selected {
            self.deps.add_requirement(item);
        } else {
            self.deps.remove_requirement(item);
        }
        let installed = item.installed;

        self.emit(UiEvent::ItemStateChanged {
            name: name.to_string(),
            installed,
            selected,
        });
        true
    }

    fn set_progress(&mut self, label: Option<String>) {
        if self.progress != label {
            self.progress = label.clone();
            self.emit(UiEvent::ProgressLabelChanged(label));
        }
    }

    fn append_log(&mut self, line: String) {
        self.log.append(line.clone());
        self.emit(UiEvent::LogLine(line));
    }

    fn emit(&self, event: UiEvent) {
        // No receiver means the front end has shut down
        let _ = self.events.send(event);
    }
}
