use std::collections::BTreeSet;

use super::deps::DependencyTracker;
use crate::backend::{Action, CancelHandle, CancelSignal};
use crate::catalog::Catalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub action: Action,
}

impl Operation {
    fn new(name: &str, action: Action) -> Self {
        Self {
            name: name.to_string(),
            action,
        }
    }
}

/// Missing dependencies first (sorted), then selected items that are not
/// installed, in catalog order. Dependencies unknown to the catalog are
/// left out.
pub fn build_install_batch(catalog: &Catalog, deps: &DependencyTracker) -> Vec<Operation> {
    let mut emitted = BTreeSet::new();
    let mut operations = Vec::new();

    for dep in deps.outstanding(|name| catalog.is_installed(name)) {
        if catalog.lookup(&dep).is_some() && emitted.insert(dep.clone()) {
            operations.push(Operation::new(&dep, Action::Install));
        }
    }

    for item in catalog.items().filter(|i| i.selected && !i.installed) {
        if emitted.insert(item.name.clone()) {
            operations.push(Operation::new(&item.name, Action::Install));
        }
    }

    operations
}

/// Selected items that are installed. Dependencies are never removed.
pub fn build_remove_batch(catalog: &Catalog) -> Vec<Operation> {
    selected_installed(catalog, Action::Remove)
}

/// Selected items that are installed, forced back in
pub fn build_reinstall_batch(catalog: &Catalog) -> Vec<Operation> {
    selected_installed(catalog, Action::Reinstall)
}

fn selected_installed(catalog: &Catalog, action: Action) -> Vec<Operation> {
    catalog
        .items()
        .filter(|i| i.selected && i.installed)
        .map(|i| Operation::new(&i.name, action))
        .collect()
}

/// A queue being drained one operation at a time
#[derive(Debug)]
pub struct Batch {
    action: Action,
    operations: Vec<Operation>,
    cursor: usize,
    succeeded: usize,
    failed: usize,
    cancel: CancelHandle,
    signal: CancelSignal,
    cancelled: bool,
}

impl Batch {
    pub fn new(action: Action, operations: Vec<Operation>, cancel: (CancelHandle, CancelSignal)) -> Self {
        Self {
            action,
            operations,
            cursor: 0,
            succeeded: 0,
            failed: 0,
            cancel: cancel.0,
            signal: cancel.1,
            cancelled: false,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn current(&self) -> Option<&Operation> {
        self.operations.get(self.cursor)
    }

    /// Move past the current operation
    pub fn advance(&mut self) -> Option<&Operation> {
        self.cursor += 1;
        self.current()
    }

    /// Operations queued after the current one
    pub fn remaining(&self) -> usize {
        self.operations.len().saturating_sub(self.cursor + 1)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn record(&mut self, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// "Installing ripgrep (1/3)"
    pub fn label(&self) -> String {
        match self.current() {
            Some(op) => format!(
                "{} {} ({}/{})",
                self.action.progress_verb(),
                op.name,
                self.cursor + 1,
                self.operations.len()
            ),
            None => String::new(),
        }
    }

    pub fn signal(&self) -> CancelSignal {
        self.signal.clone()
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cancel_pair;
    use crate::catalog::{InstallKind, Item};

    fn catalog(items: Vec<Item>) -> Catalog {
        Catalog::from_items("/tmp", items)
    }

    fn brew(name: &str) -> Item {
        Item::new(name, "cli", InstallKind::Formula { package: name.to_string() })
    }

    fn names(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|op| op.name.as_str()).collect()
    }

    fn select(catalog: &mut Catalog, deps: &mut DependencyTracker, name: &str) {
        let item = catalog.lookup_mut(name).unwrap();
        item.selected = true;
        deps.add_requirement(item);
    }

    #[test]
    fn dependencies_come_before_dependents() {
        let mut catalog = catalog(vec![
            brew("b").with_depends(&["x"]),
            brew("c"),
            brew("x"),
        ]);
        let mut deps = DependencyTracker::new();
        select(&mut catalog, &mut deps, "b");
        select(&mut catalog, &mut deps, "c");

        let ops = build_install_batch(&catalog, &deps);
        assert_eq!(names(&ops), ["x", "b", "c"]);
        assert!(ops.iter().all(|op| op.action == Action::Install));
    }

    #[test]
    fn installed_dependencies_are_not_queued() {
        let mut catalog = catalog(vec![brew("b").with_depends(&["x"]), brew("x").with_installed(true)]);
        let mut deps = DependencyTracker::new();
        select(&mut catalog, &mut deps, "b");

        assert_eq!(names(&build_install_batch(&catalog, &deps)), ["b"]);
    }

    #[test]
    fn selected_dependency_is_queued_once() {
        let mut catalog = catalog(vec![brew("a").with_depends(&["x"]), brew("x")]);
        let mut deps = DependencyTracker::new();
        select(&mut catalog, &mut deps, "a");
        select(&mut catalog, &mut deps, "x");

        assert_eq!(names(&build_install_batch(&catalog, &deps)), ["x", "a"]);
    }

    #[test]
    fn unknown_dependencies_are_left_out() {
        let mut catalog = catalog(vec![brew("a").with_depends(&["not-in-catalog"])]);
        let mut deps = DependencyTracker::new();
        select(&mut catalog, &mut deps, "a");

        assert_eq!(names(&build_install_batch(&catalog, &deps)), ["a"]);
    }

    #[test]
    fn remove_batch_only_takes_installed_and_never_dependencies() {
        let mut catalog = catalog(vec![
            brew("a").with_depends(&["x"]).with_installed(true),
            brew("b"),
            brew("x").with_installed(true),
        ]);
        let mut deps = DependencyTracker::new();
        select(&mut catalog, &mut deps, "a");
        select(&mut catalog, &mut deps, "b");

        let ops = build_remove_batch(&catalog);
        assert_eq!(names(&ops), ["a"]);
        assert_eq!(ops[0].action, Action::Remove);
    }

    #[test]
    fn empty_selection_gives_empty_batches() {
        let catalog = catalog(vec![brew("a"), brew("b").with_installed(true)]);
        let deps = DependencyTracker::new();
        assert!(build_install_batch(&catalog, &deps).is_empty());
        assert!(build_remove_batch(&catalog).is_empty());
        assert!(build_reinstall_batch(&catalog).is_empty());
    }

    #[test]
    fn batch_labels_and_cursor() {
        let ops = vec![
            Operation::new("a", Action::Install),
            Operation::new("b", Action::Install),
        ];
        let mut batch = Batch::new(Action::Install, ops, cancel_pair());
        assert_eq!(batch.label(), "Installing a (1/2)");
        assert_eq!(batch.remaining(), 1);

        assert_eq!(batch.advance().unwrap().name, "b");
        assert_eq!(batch.label(), "Installing b (2/2)");
        assert_eq!(batch.remaining(), 0);

        assert!(batch.advance().is_none());
        assert_eq!(batch.remaining(), 0);
    }
}
