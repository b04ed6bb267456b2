use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Item;

/// Which selected items need which dependencies.
///
/// A dependency is a key exactly while at least one selected item declares
/// it. Only direct dependencies are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTracker {
    required_by: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_requirement(&mut self, item: &Item) {
        for dep in &item.depends {
            self.required_by
                .entry(dep.clone())
                .or_default()
                .insert(item.name.clone());
        }
    }

    pub fn remove_requirement(&mut self, item: &Item) {
        for dep in &item.depends {
            if let Some(requirers) = self.required_by.get_mut(dep) {
                requirers.remove(&item.name);
                if requirers.is_empty() {
                    self.required_by.remove(dep);
                }
            }
        }
    }

    /// Required dependencies that `is_installed` reports missing, sorted
    pub fn outstanding<F>(&self, is_installed: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        self.required_by
            .keys()
            .filter(|dep| !is_installed(dep))
            .cloned()
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.required_by.keys().map(String::as_str)
    }

    pub fn requirers(&self, dep: &str) -> Option<&BTreeSet<String>> {
        self.required_by.get(dep)
    }

    pub fn contains(&self, dep: &str) -> bool {
        self.required_by.contains_key(dep)
    }

    pub fn is_empty(&self) -> bool {
        self.required_by.is_empty()
    }

    pub fn clear(&mut self) {
        self.required_by.clear();
    }
}
