//! Process-wide UI state shared by the toolbar and the list view.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

/// Filter settings chosen in the toolbar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClientState {
    pub search: String,
    pub favorites_only: bool,
}

/// Injectable container for [`ClientState`].
///
/// Setters report whether the value changed so callers know when the
/// current page has to be reset.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: RwLock<ClientState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ClientState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_search(&self, search: impl Into<String>) -> bool {
        let search = search.into();
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if state.search == search {
            return false;
        }
        state.search = search;
        true
    }

    pub fn set_favorites_only(&self, favorites_only: bool) -> bool {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if state.favorites_only == favorites_only {
            return false;
        }
        state.favorites_only = favorites_only;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_report_changes_only() {
        let store = StateStore::new();

        assert!(store.set_search("ann"));
        assert!(!store.set_search("ann"));
        assert!(store.set_favorites_only(true));
        assert!(!store.set_favorites_only(true));

        assert_eq!(
            store.snapshot(),
            ClientState {
                search: "ann".to_string(),
                favorites_only: true,
            }
        );
    }
}
