//! Shell integration that follows a successful install: the item's
//! `post_install` commands, then the shared `init.zsh` wiring in `~/.zshrc`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::LogSink;
use crate::backend::{run_streaming, CancelSignal};
use crate::catalog::{Catalog, Item};
use crate::config::{BackendConfig, PathsConfig};
use crate::error::Result;

const INIT_FILE: &str = "init.zsh";

/// Post-install work for one item, detached from the catalog
#[derive(Debug, Clone)]
pub struct PostInstall {
    pub name: String,
    pub commands: Vec<String>,
    pub init_script: PathBuf,
}

impl PostInstall {
    pub fn for_item(catalog: &Catalog, item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            commands: item.post_install.clone(),
            init_script: catalog.init_script(item),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellIntegration {
    shell: String,
    brew: String,
    catalog_dir: PathBuf,
    config_dir: PathBuf,
    zshrc: PathBuf,
    grace: Duration,
}

impl ShellIntegration {
    pub fn new(paths: &PathsConfig, backend: &BackendConfig) -> Self {
        Self {
            shell: backend.shell.clone(),
            brew: backend.brew.clone(),
            catalog_dir: paths.catalog_dir.clone(),
            config_dir: paths.config_dir.clone(),
            zshrc: paths.zshrc.clone(),
            grace: Duration::from_secs(backend.kill_grace_secs),
        }
    }

    /// Run every post-install command, then make sure the shell sources
    /// our init file. All commands are attempted; the first error is
    /// returned.
    pub async fn configure(
        &self,
        job: &PostInstall,
        log: &LogSink,
        cancel: &mut CancelSignal,
    ) -> Result<()> {
        let mut first_error = None;

        if !job.commands.is_empty() {
            let preamble = self.preamble(&job.init_script);
            for command in &job.commands {
                debug!("Post-install for {}: {}", job.name, command);
                let args = vec!["-c".to_string(), format!("{preamble}{command}")];
                if let Err(e) = run_streaming(&self.shell, &args, log, cancel, self.grace).await {
                    log.warn(format!("{}: post-install command failed: {e}", job.name));
                    first_error.get_or_insert(e);
                }
            }
        }

        match self.ensure_shell_integration().await {
            Ok(true) => log.line(format!(
                "Added boots to {}. Restart your shell or run: source {}",
                self.zshrc.display(),
                self.zshrc.display()
            )),
            Ok(false) => {}
            Err(e) => {
                log.warn(format!("shell integration: {e}"));
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// `brew shellenv`, plus the item's own init script when it ships one
    fn preamble(&self, init_script: &Path) -> String {
        let mut preamble = format!(
            "eval \"$({} shellenv)\" && ",
            shell_escape::escape(Cow::from(self.brew.as_str()))
        );
        if init_script.exists() {
            preamble.push_str(&format!("source {} && ", quote(init_script)));
        }
        preamble
    }

    /// Write `<config_dir>/init.zsh` and append a `source` line to the
    /// zshrc if it isn't there yet. Returns whether the zshrc changed.
    pub async fn ensure_shell_integration(&self) -> Result<bool> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        let init_path = self.config_dir.join(INIT_FILE);
        tokio::fs::write(&init_path, self.init_contents()).await?;

        let source_line = format!("source {}", quote(&init_path));
        let existing = tokio::fs::read_to_string(&self.zshrc)
            .await
            .unwrap_or_default();
        if existing.lines().any(|line| line.trim() == source_line) {
            return Ok(false);
        }

        let mut zshrc = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.zshrc)
            .await?;
        zshrc
            .write_all(format!("\n# boots\n{source_line}\n").as_bytes())
            .await?;
        zshrc.flush().await?;
        info!("Appended boots source line to {:?}", self.zshrc);
        Ok(true)
    }

    fn init_contents(&self) -> String {
        format!(
            "# boots shell integration (auto-generated)\n\
             autoload -Uz compinit && compinit -C\n\
             \n\
             for f in {}/*/*/{INIT_FILE}(N); do\n  source \"$f\"\ndone\n",
            quote(&self.catalog_dir)
        )
    }
}

fn quote(path: &Path) -> String {
    shell_escape::escape(path.to_string_lossy()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cancel_pair;
    use crate::installer::InstallerMessage;
    use tokio::sync::mpsc;

    fn integration(root: &Path) -> ShellIntegration {
        let paths = PathsConfig {
            catalog_dir: root.join("repo").join("apps"),
            config_dir: root.join("boots"),
            zshrc: root.join(".zshrc"),
        };
        let backend = BackendConfig {
            shell: "sh".to_string(),
            brew: "true".to_string(),
            ..BackendConfig::default()
        };
        ShellIntegration::new(&paths, &backend)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<InstallerMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(InstallerMessage::LogLine(line)) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn zshrc_line_is_appended_once() {
        let dir = tempfile::tempdir().unwrap();
        let hook = integration(dir.path());
        std::fs::write(dir.path().join(".zshrc"), "export EDITOR=vim\n").unwrap();

        assert!(hook.ensure_shell_integration().await.unwrap());
        assert!(!hook.ensure_shell_integration().await.unwrap());

        let zshrc = std::fs::read_to_string(dir.path().join(".zshrc")).unwrap();
        assert!(zshrc.starts_with("export EDITOR=vim\n"));
        assert_eq!(zshrc.matches("# boots").count(), 1);

        let init = std::fs::read_to_string(dir.path().join("boots").join(INIT_FILE)).unwrap();
        assert!(init.contains("/*/*/init.zsh(N)"));
    }

    #[test]
    fn preamble_sources_init_script_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let hook = integration(dir.path());
        let script = dir.path().join("init.zsh");

        assert_eq!(hook.preamble(&script), "eval \"$(true shellenv)\" && ");

        std::fs::write(&script, "").unwrap();
        assert!(hook.preamble(&script).ends_with(&format!("source {} && ", quote(&script))));
    }

    #[tokio::test]
    async fn runs_commands_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let hook = integration(dir.path());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_handle, mut cancel) = cancel_pair();

        let job = PostInstall {
            name: "demo".to_string(),
            commands: vec!["echo configured".to_string(), "exit 3".to_string()],
            init_script: dir.path().join("missing.zsh"),
        };

        let result = hook.configure(&job, &LogSink::new(tx), &mut cancel).await;
        assert!(result.is_err());

        let lines = drain(&mut rx);
        assert!(lines.iter().any(|l| l == "configured"));
        assert!(lines.iter().any(|l| l.starts_with("warning: demo: post-install")));
        assert!(dir.path().join(".zshrc").exists());
    }
}
