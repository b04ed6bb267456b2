use tokio::sync::mpsc;

use crate::backend::Action;

/// Sent from background operation tasks to the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerMessage {
    LogLine(String),
    OperationCompleted {
        name: String,
        action: Action,
        success: bool,
    },
}

/// What the view layer is allowed to observe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    LogLine(String),
    OperationCompleted {
        name: String,
        action: Action,
        success: bool,
    },
    ProgressLabelChanged(Option<String>),
    ItemStateChanged {
        name: String,
        installed: bool,
        selected: bool,
    },
    BatchFinished {
        action: Action,
        succeeded: usize,
        failed: usize,
    },
}

/// Where backends write their output lines
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<InstallerMessage>,
}

impl LogSink {
    pub fn new(tx: mpsc::UnboundedSender<InstallerMessage>) -> Self {
        Self { tx }
    }

    pub fn line(&self, text: impl Into<String>) {
        // The event loop is gone when this fails; nothing left to show it to
        let _ = self.tx.send(InstallerMessage::LogLine(text.into()));
    }

    pub fn warn(&self, text: impl AsRef<str>) {
        self.line(format!("warning: {}", text.as_ref()));
    }
}
