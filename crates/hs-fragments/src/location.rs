//! The page location the synchronizer reads and writes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::navigation::{split_url, Navigation, NavigationMode};

/// Access to the current URL and the session history.
pub trait Location {
    /// The full current URL.
    fn href(&self) -> String;

    /// Move to `navigation.url`, pushing or replacing a history entry.
    fn navigate(&self, navigation: &Navigation);

    /// The current fragment, including `#`, or empty.
    fn hash(&self) -> String {
        split_url(&self.href()).1.to_string()
    }
}

impl<T: Location + ?Sized> Location for Rc<T> {
    fn href(&self) -> String {
        (**self).href()
    }

    fn navigate(&self, navigation: &Navigation) {
        (**self).navigate(navigation)
    }
}

/// In-memory location with a history stack.
///
/// Records every navigation it receives so callers can count fragment writes.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    history: RefCell<Vec<String>>,
    writes: RefCell<Vec<Navigation>>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            history: RefCell::new(vec![href.into()]),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Change the fragment the way a user editing the address bar would.
    ///
    /// Adds a history entry but is not recorded as a write.
    pub fn set_hash(&self, hash: &str) {
        let href = self.href();
        let (base, _) = split_url(&href);
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let next = if hash.is_empty() {
            base.to_string()
        } else {
            format!("{}#{}", base, hash)
        };
        self.history.borrow_mut().push(next);
    }

    /// Go back one history entry. Returns `false` at the first entry.
    pub fn back(&self) -> bool {
        let mut history = self.history.borrow_mut();
        if history.len() < 2 {
            return false;
        }
        history.pop();
        true
    }

    /// Navigations written so far, oldest first.
    pub fn writes(&self) -> Vec<Navigation> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Number of entries in the history stack.
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.history.borrow().last().cloned().unwrap_or_default()
    }

    fn navigate(&self, navigation: &Navigation) {
        let mut history = self.history.borrow_mut();
        match navigation.mode {
            NavigationMode::Push => history.push(navigation.url.clone()),
            NavigationMode::Replace => match history.last_mut() {
                Some(current) => *current = navigation.url.clone(),
                None => history.push(navigation.url.clone()),
            },
        }
        self.writes.borrow_mut().push(navigation.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_replace_and_back() {
        let location = MemoryLocation::new("/decks/");
        location.navigate(&Navigation {
            url: "/decks/#page=2".to_string(),
            mode: NavigationMode::Push,
        });
        location.navigate(&Navigation {
            url: "/decks/#page=3".to_string(),
            mode: NavigationMode::Replace,
        });

        assert_eq!(location.hash(), "#page=3");
        assert_eq!(location.history_len(), 2);
        assert_eq!(location.write_count(), 2);

        assert!(location.back());
        assert_eq!(location.href(), "/decks/");
        assert!(!location.back());
    }

    #[test]
    fn test_set_hash_is_not_a_write() {
        let location = MemoryLocation::new("/cards/#old=1");
        location.set_hash("#tab=overview");
        assert_eq!(location.href(), "/cards/#tab=overview");
        location.set_hash("");
        assert_eq!(location.href(), "/cards/");
        assert_eq!(location.write_count(), 0);
    }
}
