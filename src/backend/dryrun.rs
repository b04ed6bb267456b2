use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

use super::{Action, Backend, CancelSignal, Job};
use crate::catalog::InstallKind;
use crate::error::{BootsError, Result};
use crate::installer::LogSink;

const STEPS: u8 = 5;

/// Pretends to run every operation. Installed state only lives in memory.
#[derive(Debug, Clone)]
pub struct DryrunBackend {
    installed: Arc<Mutex<BTreeSet<String>>>,
    step: Duration,
}

impl Default for DryrunBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

impl DryrunBackend {
    pub fn new(step: Duration) -> Self {
        Self {
            installed: Arc::new(Mutex::new(BTreeSet::new())),
            step,
        }
    }

    fn set_installed(&self, name: &str, installed: bool) {
        if let Ok(mut set) = self.installed.lock() {
            if installed {
                set.insert(name.to_string());
            } else {
                set.remove(name);
            }
        }
    }

    async fn run(self, action: Action, job: Job, log: LogSink, mut cancel: CancelSignal) -> Result<()> {
        log.line(format!(
            "[dryrun] {} {} via {}",
            action.progress_verb().to_lowercase(),
            job.name,
            job.kind.label()
        ));

        for step in 1..=STEPS {
            tokio::select! {
                _ = tokio::time::sleep(self.step) => {}
                _ = cancel.cancelled() => return Err(BootsError::Cancelled),
            }
            log.line(format!("[dryrun] {}: {}%", job.name, step as u32 * 100 / STEPS as u32));
        }

        self.set_installed(&job.name, action != Action::Remove);
        info!("Dryrun {} {}", action.display_name(), job.name);
        Ok(())
    }
}

impl Backend for DryrunBackend {
    fn is_installed(&self, _kind: &InstallKind, name: &str) -> bool {
        self.installed
            .lock()
            .map(|set| set.contains(name))
            .unwrap_or(false)
    }

    fn execute(
        &self,
        action: Action,
        job: Job,
        log: LogSink,
        cancel: CancelSignal,
    ) -> BoxFuture<'static, Result<()>> {
        self.clone().run(action, job, log, cancel).boxed()
    }
}
