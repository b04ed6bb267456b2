//! Package manager adapters.
//!
//! A backend gets owned, immutable inputs for one operation and reports back
//! only through the [`LogSink`] and its returned result. It never sees
//! installer state.

mod command;
mod dryrun;
mod process;
#[cfg(test)]
pub(crate) mod testing;

pub use command::CommandBackend;
pub use dryrun::DryrunBackend;
pub use process::run_streaming;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::catalog::{InstallKind, Item};
use crate::error::Result;
use crate::installer::LogSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
    Reinstall,
}

impl Action {
    /// Used in progress labels: "Installing ripgrep (1/3)"
    pub fn progress_verb(&self) -> &'static str {
        match self {
            Action::Install => "Installing",
            Action::Remove => "Removing",
            Action::Reinstall => "Reinstalling",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Action::Install => "Install",
            Action::Remove => "Remove",
            Action::Reinstall => "Reinstall",
        }
    }
}

/// Everything a backend needs to act on one item
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub kind: InstallKind,
    pub zsh: Option<String>,
}

impl From<&Item> for Job {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            kind: item.kind.clone(),
            zsh: item.zsh.clone(),
        }
    }
}

pub trait Backend: Send + Sync {
    /// Blocking installed check, used at startup and by `status`
    fn is_installed(&self, kind: &InstallKind, name: &str) -> bool;

    /// Run one operation, streaming output lines into `log`
    fn execute(
        &self,
        action: Action,
        job: Job,
        log: LogSink,
        cancel: CancelSignal,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Receiving half of a per-batch cancellation flag
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}
