use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};

use super::{Action, Backend, CancelSignal, Job, process};
use crate::catalog::InstallKind;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::installer::LogSink;

/// Runs brew, npm and mas for real. Shell-only items are tracked with a
/// marker directory under `<config_dir>/apps/<name>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    brew: String,
    npm: String,
    mas: String,
    config_dir: PathBuf,
    grace: Duration,
}

impl CommandBackend {
    pub fn new(config: &BackendConfig, config_dir: PathBuf) -> Self {
        Self {
            brew: config.brew.clone(),
            npm: config.npm.clone(),
            mas: config.mas.clone(),
            config_dir,
            grace: Duration::from_secs(config.kill_grace_secs),
        }
    }

    /// Program and arguments for an action. `None` for shell-only items,
    /// which have no package manager.
    fn command_for(&self, action: Action, kind: &InstallKind) -> Option<(String, Vec<String>)> {
        let args = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let command = match kind {
            InstallKind::Formula { package } => {
                let package = package.as_str();
                let verb = match action {
                    Action::Install => "install",
                    Action::Remove => "uninstall",
                    Action::Reinstall => "reinstall",
                };
                (self.brew.clone(), args(&[verb, package]))
            }
            InstallKind::Cask { package } => {
                let package = package.as_str();
                let verb = match action {
                    Action::Install => "install",
                    Action::Remove => "uninstall",
                    Action::Reinstall => "reinstall",
                };
                (self.brew.clone(), args(&[verb, "--cask", package]))
            }
            InstallKind::Npm { package } => {
                let package = package.as_str();
                let parts = match action {
                    Action::Install => args(&["install", "-g", package]),
                    Action::Remove => args(&["uninstall", "-g", package]),
                    Action::Reinstall => args(&["install", "-g", "--force", package]),
                };
                (self.npm.clone(), parts)
            }
            InstallKind::AppStore { id } => {
                let id = id.to_string();
                let id = id.as_str();
                let parts = match action {
                    Action::Install => args(&["install", id]),
                    Action::Remove => args(&["uninstall", id]),
                    Action::Reinstall => args(&["install", "--force", id]),
                };
                (self.mas.clone(), parts)
            }
            InstallKind::Shell => return None,
        };
        Some(command)
    }

    fn shell_marker(&self, name: &str) -> PathBuf {
        self.config_dir.join("apps").join(name)
    }

    async fn run(self, action: Action, job: Job, log: LogSink, mut cancel: CancelSignal) -> Result<()> {
        match self.command_for(action, &job.kind) {
            Some((program, args)) => {
                process::run_streaming(&program, &args, &log, &mut cancel, self.grace).await
            }
            None => self.run_shell_only(action, &job, &log).await,
        }
    }

    async fn run_shell_only(&self, action: Action, job: &Job, log: &LogSink) -> Result<()> {
        let marker = self.shell_marker(&job.name);
        match action {
            Action::Install | Action::Reinstall => {
                tokio::fs::create_dir_all(&marker).await?;
                if let Some(ref snippet) = job.zsh {
                    tokio::fs::write(marker.join("zshrc.zsh"), snippet).await?;
                }
                log.line(format!("Added shell integration for {}", job.name));
            }
            Action::Remove => {
                if tokio::fs::try_exists(&marker).await? {
                    tokio::fs::remove_dir_all(&marker).await?;
                }
                log.line(format!("Removed shell integration for {}", job.name));
            }
        }
        info!("{} {} (shell only)", action.display_name(), job.name);
        Ok(())
    }

    fn probe(&self, program: &str, args: &[&str]) -> bool {
        debug!("Probing: {} {:?}", program, args);
        Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn mas_has(&self, id: u64) -> bool {
        let output = Command::new(&self.mas).arg("list").stderr(Stdio::null()).output();
        match output {
            Ok(out) if out.status.success() => mas_list_contains(&String::from_utf8_lossy(&out.stdout), id),
            _ => false,
        }
    }
}

impl Backend for CommandBackend {
    fn is_installed(&self, kind: &InstallKind, name: &str) -> bool {
        match kind {
            InstallKind::Formula { package } => self.probe(&self.brew, &["list", "--formula", package.as_str()]),
            InstallKind::Cask { package } => self.probe(&self.brew, &["list", "--cask", package.as_str()]),
            InstallKind::Npm { package } => self.probe(&self.npm, &["list", "-g", package.as_str()]),
            InstallKind::AppStore { id } => self.mas_has(*id),
            InstallKind::Shell => self.shell_marker(name).is_dir(),
        }
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

/// `mas list` prints `<id>  <name> (<version>)` per app
fn mas_list_contains(listing: &str, id: u64) -> bool {
    let id = id.to_string();
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|first| first == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cancel_pair;
    use tokio::sync::mpsc;

    fn backend(config_dir: PathBuf) -> CommandBackend {
        CommandBackend::new(&BackendConfig::default(), config_dir)
    }

    fn formula(p: &str) -> InstallKind {
        InstallKind::Formula { package: p.to_string() }
    }

    #[test]
    fn brew_commands() {
        let b = backend(PathBuf::from("/tmp"));
        let (program, args) = b.command_for(Action::Install, &formula("ripgrep")).unwrap();
        assert_eq!(program, "/opt/homebrew/bin/brew");
        assert_eq!(args, ["install", "ripgrep"]);

        let (_, args) = b.command_for(Action::Remove, &formula("ripgrep")).unwrap();
        assert_eq!(args, ["uninstall", "ripgrep"]);

        let cask = InstallKind::Cask { package: "slack".to_string() };
        let (_, args) = b.command_for(Action::Reinstall, &cask).unwrap();
        assert_eq!(args, ["reinstall", "--cask", "slack"]);
    }

    #[test]
    fn npm_and_mas_commands() {
        let b = backend(PathBuf::from("/tmp"));
        let npm = InstallKind::Npm { package: "@scope/tool".to_string() };
        let (program, args) = b.command_for(Action::Reinstall, &npm).unwrap();
        assert_eq!(program, "npm");
        assert_eq!(args, ["install", "-g", "--force", "@scope/tool"]);

        let mas = InstallKind::AppStore { id: 497799835 };
        let (program, args) = b.command_for(Action::Remove, &mas).unwrap();
        assert_eq!(program, "mas");
        assert_eq!(args, ["uninstall", "497799835"]);

        assert!(b.command_for(Action::Install, &InstallKind::Shell).is_none());
    }

    #[test]
    fn parses_mas_list() {
        let listing = "497799835  Xcode          (15.0)\n1333542190  1Password 7  (7.9.11)\n";
        assert!(mas_list_contains(listing, 497799835));
        assert!(mas_list_contains(listing, 1333542190));
        assert!(!mas_list_contains(listing, 4977998));
    }

    #[tokio::test]
    async fn shell_only_items_use_a_marker_dir() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend(dir.path().to_path_buf());
        let job = Job {
            name: "starship".to_string(),
            kind: InstallKind::Shell,
            zsh: Some("eval \"$(starship init zsh)\"\n".to_string()),
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        let (_handle, cancel) = cancel_pair();

        assert!(!b.is_installed(&InstallKind::Shell, "starship"));
        b.execute(Action::Install, job.clone(), LogSink::new(tx.clone()), cancel.clone())
            .await
            .unwrap();
        assert!(b.is_installed(&InstallKind::Shell, "starship"));
        let snippet = std::fs::read_to_string(dir.path().join("apps/starship/zshrc.zsh")).unwrap();
        assert!(snippet.contains("starship init zsh"));

        b.execute(Action::Remove, job, LogSink::new(tx), cancel).await.unwrap();
        assert!(!b.is_installed(&InstallKind::Shell, "starship"));
    }
}
