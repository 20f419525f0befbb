//! Diffing a freshly delivered snapshot against what is currently displayed.
//!
//! [`reconcile`] is pure: it looks at the rendered state and a snapshot and
//! says which ids to insert, update and remove. [`RenderedState::apply`] then
//! commits that plan in one step and reports the resulting changes for the
//! presentation layer, so no reader ever observes a half-applied pass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Normalize;
use crate::store::Snapshot;

/// Stable identity of one displayed entry, assigned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendered<T> {
    pub handle: ViewHandle,
    pub value: T,
}

/// What is on screen for one collection, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedState<T> {
    entries: IndexMap<String, Rendered<T>>,
    next_handle: u64,
}

impl<T> Default for RenderedState<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            next_handle: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<T> {
    pub to_insert: Vec<(String, T)>,
    pub to_update: Vec<(String, ViewHandle, T)>,
    pub to_remove: Vec<(String, ViewHandle)>,
}

impl<T> Default for Reconciliation<T> {
    fn default() -> Self {
        Self {
            to_insert: Vec::new(),
            to_update: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

impl<T> Reconciliation<T> {
    pub fn len(&self) -> usize {
        self.to_insert.len() + self.to_update.len() + self.to_remove.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderChange<T> {
    Insert {
        id: String,
        handle: ViewHandle,
        value: T,
    },
    Update {
        id: String,
        handle: ViewHandle,
        value: T,
    },
    Remove {
        id: String,
        handle: ViewHandle,
    },
}

impl<T> RenderChange<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Remove { id, .. } => id,
        }
    }
}

/// Computes the insert/update/remove plan that turns `previous` into the
/// contents of `snapshot`.
///
/// An absent snapshot is an empty collection. Removals come out in display
/// order, inserts and updates in snapshot key order. Updates are issued for
/// every surviving id whether or not its value changed.
pub fn reconcile<T: Normalize>(previous: &RenderedState<T>, snapshot: &Snapshot) -> Reconciliation<T> {
    let mut plan = Reconciliation::default();

    let children = match snapshot.children() {
        Some(children) => Some(children),
        None => {
            if snapshot.exists() {
                warn!(value = %snapshot.value(), "collection snapshot is not a mapping, treating as empty");
            }
            None
        }
    };

    let mut next: IndexMap<&str, T> = IndexMap::new();
    for (id, raw) in children.into_iter().flatten() {
        match T::normalize(raw) {
            Some(value) => {
                next.insert(id.as_str(), value);
            }
            None => warn!(%id, "skipping entry that cannot be normalized"),
        }
    }

    for (id, rendered) in &previous.entries {
        if !next.contains_key(id.as_str()) {
            plan.to_remove.push((id.clone(), rendered.handle));
        }
    }

    for (id, value) in next {
        match previous.entries.get(id) {
            Some(rendered) => plan.to_update.push((id.to_string(), rendered.handle, value)),
            None => plan.to_insert.push((id.to_string(), value)),
        }
    }

    plan
}

impl<T> RenderedState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Rendered<T>> {
        self.entries.get(id)
    }

    pub fn value(&self, id: &str) -> Option<&T> {
        self.entries.get(id).map(|r| &r.value)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rendered<T>)> {
        self.entries.iter().map(|(id, r)| (id.as_str(), r))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn allocate_handle(&mut self) -> ViewHandle {
        let handle = ViewHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl<T: Clone> RenderedState<T> {
    /// Commits a plan produced by [`reconcile`] against this same state.
    ///
    /// Removed entries keep the relative order of the survivors; inserted
    /// entries are appended. Plan entries that no longer match this state
    /// (an update for an id that is gone, an insert for an id already shown)
    /// are applied as the nearest consistent operation.
    pub fn apply(&mut self, plan: Reconciliation<T>) -> Vec<RenderChange<T>> {
        let mut changes = Vec::with_capacity(plan.len());

        for (id, handle) in plan.to_remove {
            if self.entries.shift_remove(&id).is_some() {
                changes.push(RenderChange::Remove { id, handle });
            }
        }

        for (id, _, value) in plan.to_update {
            match self.entries.get_mut(&id) {
                Some(rendered) => {
                    rendered.value = value.clone();
                    changes.push(RenderChange::Update {
                        id,
                        handle: rendered.handle,
                        value,
                    });
                }
                None => self.insert(id, value, &mut changes),
            }
        }

        for (id, value) in plan.to_insert {
            match self.entries.get_mut(&id) {
                Some(rendered) => {
                    rendered.value = value.clone();
                    changes.push(RenderChange::Update {
                        id,
                        handle: rendered.handle,
                        value,
                    });
                }
                None => self.insert(id, value, &mut changes),
            }
        }

        changes
    }

    fn insert(&mut self, id: String, value: T, changes: &mut Vec<RenderChange<T>>) {
        let handle = self.allocate_handle();
        self.entries.insert(
            id.clone(),
            Rendered {
                handle,
                value: value.clone(),
            },
        );
        changes.push(RenderChange::Insert { id, handle, value });
    }
}
