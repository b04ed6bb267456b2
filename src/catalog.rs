//! App catalog: `<root>/<category>/<name>/app.toml` entries grouped into
//! categories.
//!
//! The catalog is loaded once at startup. After that only the installer
//! flips the `installed` and `selected` flags of its items.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{BootsError, Result};

const APP_FILE: &str = "app.toml";
const INIT_SCRIPT: &str = "init.zsh";

/// Categories that always come first, with their display names
const KNOWN_CATEGORIES: [(&str, &str); 3] = [
    ("cli", "CLI Tools"),
    ("apps", "Desktop Apps"),
    ("mas", "App Store"),
];

/// How an item gets installed, with whatever that backend needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallKind {
    Formula { package: String },
    Cask { package: String },
    Npm { package: String },
    AppStore { id: u64 },
    Shell,
}

impl InstallKind {
    pub fn label(&self) -> &'static str {
        match self {
            InstallKind::Formula { .. } => "brew",
            InstallKind::Cask { .. } => "cask",
            InstallKind::Npm { .. } => "npm",
            InstallKind::AppStore { .. } => "mas",
            InstallKind::Shell => "shell",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub kind: InstallKind,
    pub category: String,
    pub depends: Vec<String>,
    pub post_install: Vec<String>,
    pub zsh: Option<String>,
    pub(crate) installed: bool,
    pub(crate) selected: bool,
}

impl Item {
    pub fn new(name: &str, category: &str, kind: InstallKind) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            kind,
            category: category.to_string(),
            depends: Vec::new(),
            post_install: Vec::new(),
            zsh: None,
            installed: false,
            selected: false,
        }
    }

    pub fn with_depends(mut self, depends: &[&str]) -> Self {
        self.depends = depends.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub key: String,
    pub items: Vec<Item>,
}

impl Category {
    pub fn display_name(&self) -> &str {
        KNOWN_CATEGORIES
            .iter()
            .find(|(key, _)| *key == self.key)
            .map(|(_, name)| *name)
            .unwrap_or(self.key.as_str())
    }

    pub fn installed_count(&self) -> usize {
        self.items.iter().filter(|i| i.installed).count()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    /// Selected items that a remove or reinstall would act on
    pub fn selected_installed_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected && i.installed).count()
    }

    /// Selected items that an install would act on
    pub fn selected_pending_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected && !i.installed).count()
    }
}

/// Supported values of the `install` key
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum InstallType {
    Brew,
    Cask,
    Npm,
    Mas,
    Shell,
}

/// Raw contents of an `app.toml`
#[derive(Debug, Deserialize)]
struct AppRecord {
    install: InstallType,
    #[serde(default)]
    description: String,
    package: Option<String>,
    id: Option<u64>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    post_install: Vec<String>,
    zsh: Option<String>,
}

impl AppRecord {
    fn into_item(self, name: &str, category: &str) -> Result<Item> {
        let package = self.package.unwrap_or_else(|| name.to_string());
        let kind = match self.install {
            InstallType::Brew => InstallKind::Formula { package },
            InstallType::Cask => InstallKind::Cask { package },
            InstallType::Npm => InstallKind::Npm { package },
            InstallType::Mas => match self.id {
                Some(id) => InstallKind::AppStore { id },
                None => {
                    return Err(BootsError::Catalog(format!(
                        "{name}: mas install requires an id"
                    )));
                }
            },
            InstallType::Shell => InstallKind::Shell,
        };

        Ok(Item {
            name: name.to_string(),
            description: self.description,
            kind,
            category: category.to_string(),
            depends: self.depends,
            post_install: self.post_install,
            zsh: self.zsh,
            installed: false,
            selected: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    categories: Vec<Category>,
}

impl Catalog {
    /// Scan `root/<category>/<name>/app.toml`. Entries that can't be read or
    /// parsed are skipped.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut items = Vec::new();

        let categories = std::fs::read_dir(root).map_err(|e| {
            BootsError::Catalog(format!("cannot read catalog dir {}: {e}", root.display()))
        })?;

        for category in categories.flatten() {
            if !category.path().is_dir() {
                continue;
            }
            let category_key = category.file_name().to_string_lossy().to_string();

            let Ok(apps) = std::fs::read_dir(category.path()) else {
                warn!("Skipping unreadable category {}", category_key);
                continue;
            };

            for app in apps.flatten() {
                if !app.path().is_dir() {
                    continue;
                }
                let name = app.file_name().to_string_lossy().to_string();
                let app_file = app.path().join(APP_FILE);

                match load_item(&app_file, &name, &category_key) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => debug!("No {} in {:?}", APP_FILE, app.path()),
                    Err(e) => warn!("Skipping {}: {}", app_file.display(), e),
                }
            }
        }

        info!("Loaded {} catalog items from {:?}", items.len(), root);
        Ok(Self::from_items(root, items))
    }

    /// Group items into categories with a stable order: known categories
    /// first, then the rest alphabetically; items sorted by name.
    pub fn from_items<P: AsRef<Path>>(root: P, items: Vec<Item>) -> Self {
        let mut grouped: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        for item in items {
            grouped.entry(item.category.clone()).or_default().push(item);
        }

        let mut categories = Vec::new();
        for (key, _) in KNOWN_CATEGORIES {
            if let Some(items) = grouped.remove(key) {
                categories.push(Category {
                    key: key.to_string(),
                    items,
                });
            }
        }
        categories.extend(
            grouped
                .into_iter()
                .map(|(key, items)| Category { key, items }),
        );

        for category in &mut categories {
            category.items.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Self {
            root: root.as_ref().to_path_buf(),
            categories,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn lookup(&self, name: &str) -> Option<&Item> {
        self.items().find(|item| item.name == name)
    }

    pub(crate) fn lookup_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|item| item.name == name)
    }

    /// All items in display order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.categories.iter_mut().flat_map(|c| c.items.iter_mut())
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|item| item.installed)
    }

    /// Optional `init.zsh` shipped next to an item's `app.toml`
    pub fn init_script(&self, item: &Item) -> PathBuf {
        self.root
            .join(&item.category)
            .join(&item.name)
            .join(INIT_SCRIPT)
    }

    /// Ask the backend for the current installed state of every item
    pub fn refresh_installed(&mut self, backend: &dyn Backend) {
        for item in self.items_mut() {
            item.installed = backend.is_installed(&item.kind, &item.name);
        }
        let installed = self.items().filter(|i| i.installed).count();
        info!("{} of {} catalog items already installed", installed, self.items().count());
    }
}

fn load_item(path: &Path, name: &str, category: &str) -> Result<Option<Item>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let record: AppRecord = toml::from_str(&content)?;
    record.into_item(name, category).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_app(root: &Path, category: &str, name: &str, body: &str) {
        let dir = root.join(category).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(APP_FILE), body).unwrap();
    }

    #[test]
    fn loads_items_into_ordered_categories() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "zzz", "tool", "install = \"brew\"\n");
        write_app(dir.path(), "apps", "slack", "install = \"cask\"\ndescription = \"Chat\"\n");
        write_app(dir.path(), "cli", "ripgrep", "install = \"brew\"\n");
        write_app(
            dir.path(),
            "cli",
            "bat",
            "install = \"brew\"\ndepends = [\"ripgrep\"]\npost_install = [\"bat cache --build\"]\n",
        );
        write_app(dir.path(), "mas", "xcode", "install = \"mas\"\nid = 497799835\n");

        let catalog = Catalog::load(dir.path()).unwrap();
        let keys: Vec<&str> = catalog.categories().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["cli", "apps", "mas", "zzz"]);

        let cli: Vec<&str> = catalog.categories()[0]
            .items
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(cli, ["bat", "ripgrep"]);

        let bat = catalog.lookup("bat").unwrap();
        assert_eq!(bat.depends, ["ripgrep"]);
        assert_eq!(bat.post_install, ["bat cache --build"]);
        assert_eq!(bat.kind, InstallKind::Formula { package: "bat".to_string() });

        assert_eq!(
            catalog.lookup("xcode").unwrap().kind,
            InstallKind::AppStore { id: 497799835 }
        );
        assert_eq!(catalog.category("apps").unwrap().display_name(), "Desktop Apps");
        assert_eq!(catalog.category("zzz").unwrap().display_name(), "zzz");
    }

    #[test]
    fn package_override_is_used() {
        let dir = tempfile::tempdir().unwrap();
        write_app(
            dir.path(),
            "cli",
            "claude",
            "install = \"npm\"\npackage = \"@anthropic-ai/claude-code\"\n",
        );

        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(
            catalog.lookup("claude").unwrap().kind,
            InstallKind::Npm {
                package: "@anthropic-ai/claude-code".to_string()
            }
        );
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "cli", "good", "install = \"brew\"\n");
        write_app(dir.path(), "cli", "unknown-kind", "install = \"apt\"\n");
        write_app(dir.path(), "mas", "no-id", "install = \"mas\"\n");
        write_app(dir.path(), "cli", "broken", "install = \n");
        fs::create_dir_all(dir.path().join("cli").join("empty")).unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        let names: Vec<&str> = catalog.items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["good"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Catalog::load(dir.path().join("missing")).is_err());
    }

    #[test]
    fn category_counts() {
        let mut catalog = Catalog::from_items(
            "/tmp",
            vec![
                Item::new("a", "cli", InstallKind::Shell).with_installed(true),
                Item::new("b", "cli", InstallKind::Shell),
                Item::new("c", "cli", InstallKind::Shell),
            ],
        );
        catalog.lookup_mut("a").unwrap().selected = true;
        catalog.lookup_mut("b").unwrap().selected = true;

        let cli = catalog.category("cli").unwrap();
        assert_eq!(cli.installed_count(), 1);
        assert_eq!(cli.selected_count(), 2);
        assert_eq!(cli.selected_installed_count(), 1);
        assert_eq!(cli.selected_pending_count(), 1);
    }
}
