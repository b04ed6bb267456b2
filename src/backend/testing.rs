//! Scripted backend for installer tests

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Action, Backend, CancelSignal, Job};
use crate::catalog::InstallKind;
use crate::error::{BootsError, Result};
use crate::installer::LogSink;

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedBackend {
    failures: BTreeSet<String>,
    delays: BTreeMap<String, Duration>,
    calls: Arc<Mutex<Vec<(Action, String)>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failures.insert(name.to_string());
        self
    }

    pub fn delayed(mut self, name: &str, millis: u64) -> Self {
        self.delays.insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> Vec<(Action, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Backend for ScriptedBackend {
    fn is_installed(&self, _kind: &InstallKind, _name: &str) -> bool {
        false
    }

    fn execute(
        &self,
        action: Action,
        job: Job,
        log: LogSink,
        mut cancel: CancelSignal,
    ) -> BoxFuture<'static, Result<()>> {
        let this = self.clone();
        async move {
            let now = this.active.fetch_add(1, Ordering::SeqCst) + 1;
            this.max_active.fetch_max(now, Ordering::SeqCst);
            this.calls.lock().unwrap().push((action, job.name.clone()));

            log.line(format!("{}: start", job.name));
            let delay = this.delays.get(&job.name).copied().unwrap_or_default();
            let cancelled = tokio::select! {
                _ = tokio::time::sleep(delay) => false,
                _ = cancel.cancelled() => true,
            };
            log.line(format!("{}: end", job.name));
            this.active.fetch_sub(1, Ordering::SeqCst);

            if cancelled {
                Err(BootsError::Cancelled)
            } else if this.failures.contains(&job.name) {
                Err(BootsError::ExitStatus {
                    program: "scripted".to_string(),
                    status: "exit status: 1".to_string(),
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }
}
