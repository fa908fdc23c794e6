//! Two-way binding between typed state and the URL fragment.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use hs_core::FragmentConfig;
use serde::Serialize;

use crate::codec::decode_overrides;
use crate::location::Location;
use crate::navigation::{compute_next_url, Navigation};
use crate::schema::{FieldKind, FieldValue, FragmentSchema, Overrides};
use crate::timer::DebounceTimer;

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// The override was stored and the fragment rewritten.
    Applied,
    /// The override was removed (value equal to the default, or a reset).
    Cleared,
    /// The value is waiting for the debounce timer.
    Buffered,
    /// Nothing changed.
    Ignored(IgnoreReason),
}

/// Why a mutation was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The key is not in the schema.
    Undeclared,
    /// The key is declared immutable.
    Immutable,
    /// The value's kind differs from the default's.
    KindMismatch,
    /// `toggle` on a field that is not a list.
    NotAList,
    /// The synchronizer was disposed.
    Disposed,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undeclared => write!(f, "undeclared key"),
            Self::Immutable => write!(f, "immutable key"),
            Self::KindMismatch => write!(f, "kind mismatch"),
            Self::NotAList => write!(f, "not a list"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// The props exposed for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProp {
    pub key: String,
    /// Current value: buffered, else overridden, else the default.
    pub value: FieldValue,
    pub default: FieldValue,
    /// The override, if the field has one.
    pub custom: Option<FieldValue>,
}

#[derive(Default)]
struct State {
    overrides: Overrides,
    /// Debounced values not yet committed. `None` clears the override on commit.
    intermediate: BTreeMap<String, Option<FieldValue>>,
    disposed: bool,
}

struct Shared<L, D> {
    schema: FragmentSchema,
    location: L,
    timer: D,
    debounce: Duration,
    keep_defaults: bool,
    state: RefCell<State>,
}

/// Fragment state synchronizer.
///
/// Mounting reads the current fragment; every mutation rewrites it through
/// the `Location`. Debounced fields are buffered and committed together
/// when the `DebounceTimer` fires, producing one navigation for a burst of
/// updates. Misuse (undeclared keys, immutable keys, wrong kinds) is logged
/// and reported as [`SetOutcome::Ignored`].
///
/// Dropping the synchronizer cancels any pending commit.
pub struct Fragments<L: Location + 'static, D: DebounceTimer + 'static> {
    shared: Rc<Shared<L, D>>,
}

impl<L: Location + 'static, D: DebounceTimer + 'static> Fragments<L, D> {
    /// Mount on `location`, seeding overrides from its fragment.
    pub fn mount(schema: FragmentSchema, location: L, timer: D, config: &FragmentConfig) -> Self {
        let overrides = decode_overrides(&location.hash(), &schema, config.keep_defaults);
        tracing::debug!(fields = schema.len(), overrides = overrides.len(), "fragments mounted");

        Self {
            shared: Rc::new(Shared {
                schema,
                location,
                timer,
                debounce: config.debounce(),
                keep_defaults: config.keep_defaults,
                state: RefCell::new(State {
                    overrides,
                    ..State::default()
                }),
            }),
        }
    }

    pub fn schema(&self) -> &FragmentSchema {
        &self.shared.schema
    }

    pub fn location(&self) -> &L {
        &self.shared.location
    }

    /// Set `key` to `value`.
    pub fn set(&self, key: &str, value: impl Into<FieldValue>) -> SetOutcome {
        let shared = &self.shared;
        let value = value.into();

        if shared.state.borrow().disposed {
            return SetOutcome::Ignored(IgnoreReason::Disposed);
        }
        let Some(field) = shared.schema.get(key) else {
            tracing::error!(key, "attempted to set undeclared fragment key");
            return SetOutcome::Ignored(IgnoreReason::Undeclared);
        };
        if field.immutable {
            tracing::debug!(key, "ignoring update to immutable fragment key");
            return SetOutcome::Ignored(IgnoreReason::Immutable);
        }
        if value.kind() != field.kind() {
            tracing::error!(
                key,
                expected = %field.kind(),
                got = %value.kind(),
                "fragment value has the wrong kind"
            );
            return SetOutcome::Ignored(IgnoreReason::KindMismatch);
        }

        let next = if !shared.keep_defaults && value == field.default {
            None
        } else {
            Some(value)
        };

        if field.debounce {
            shared
                .state
                .borrow_mut()
                .intermediate
                .insert(key.to_string(), next);
            let weak = Rc::downgrade(shared);
            shared.timer.start(shared.debounce, Box::new(move || flush_weak(&weak)));
            return SetOutcome::Buffered;
        }

        let outcome = {
            let mut state = shared.state.borrow_mut();
            match next {
                Some(value) => {
                    state.overrides.insert(key.to_string(), value);
                    SetOutcome::Applied
                }
                None => {
                    state.overrides.remove(key);
                    SetOutcome::Cleared
                }
            }
        };
        shared.commit();
        outcome
    }

    /// Add `item` to a list field, or remove it if present.
    pub fn toggle(&self, key: &str, item: &str) -> SetOutcome {
        let Some(field) = self.shared.schema.get(key) else {
            tracing::error!(key, "attempted to toggle undeclared fragment key");
            return SetOutcome::Ignored(IgnoreReason::Undeclared);
        };
        if field.kind() != FieldKind::List {
            tracing::error!(key, kind = %field.kind(), "toggle on a non-list fragment key");
            return SetOutcome::Ignored(IgnoreReason::NotAList);
        }

        let mut items = self
            .value(key)
            .and_then(|v| v.as_list().map(<[String]>::to_vec))
            .unwrap_or_default();
        match items.iter().position(|i| i == item) {
            Some(idx) => {
                items.remove(idx);
            }
            None => items.push(item.to_string()),
        }
        self.set(key, FieldValue::List(items))
    }

    /// Revert `key` to its default, dropping any buffered value.
    pub fn reset(&self, key: &str) -> SetOutcome {
        let shared = &self.shared;
        if !shared.schema.contains(key) {
            tracing::error!(key, "attempted to reset undeclared fragment key");
            return SetOutcome::Ignored(IgnoreReason::Undeclared);
        }
        {
            let mut state = shared.state.borrow_mut();
            if state.disposed {
                return SetOutcome::Ignored(IgnoreReason::Disposed);
            }
            state.overrides.remove(key);
            state.intermediate.remove(key);
            if state.intermediate.is_empty() {
                shared.timer.cancel();
            }
        }
        shared.commit();
        SetOutcome::Cleared
    }

    /// Revert every field to its default.
    pub fn reset_all(&self) {
        let shared = &self.shared;
        {
            let mut state = shared.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.overrides.clear();
            state.intermediate.clear();
        }
        shared.timer.cancel();
        shared.commit();
    }

    /// Re-read the fragment after an external change (back/forward, manual edit).
    ///
    /// Overrides are replaced wholesale and buffered values are discarded.
    /// Returns whether the overrides changed.
    pub fn on_hash_change(&self) -> bool {
        let shared = &self.shared;
        if shared.state.borrow().disposed {
            return false;
        }
        let overrides = decode_overrides(
            &shared.location.hash(),
            &shared.schema,
            shared.keep_defaults,
        );
        shared.timer.cancel();

        let mut state = shared.state.borrow_mut();
        state.intermediate.clear();
        let changed = state.overrides != overrides;
        if changed {
            tracing::debug!(overrides = overrides.len(), "fragment changed externally");
        }
        state.overrides = overrides;
        changed
    }

    /// Commit buffered values now. Returns `false` if nothing was buffered.
    pub fn flush(&self) -> bool {
        self.shared.timer.cancel();
        self.shared.flush()
    }

    /// Current value of `key`, or `None` if undeclared.
    pub fn value(&self, key: &str) -> Option<FieldValue> {
        let field = self.shared.schema.get(key)?;
        let state = self.shared.state.borrow();
        let value = match state.intermediate.get(key) {
            Some(buffered) => buffered.clone(),
            None => state.overrides.get(key).cloned(),
        };
        Some(value.unwrap_or_else(|| field.default.clone()))
    }

    /// Whether `key` currently has an override.
    pub fn is_custom(&self, key: &str) -> bool {
        self.custom(key).is_some()
    }

    /// The override of `key`, buffered values included.
    pub fn custom(&self, key: &str) -> Option<FieldValue> {
        let state = self.shared.state.borrow();
        match state.intermediate.get(key) {
            Some(buffered) => buffered.clone(),
            None => state.overrides.get(key).cloned(),
        }
    }

    /// Declared default of `key`.
    pub fn default_of(&self, key: &str) -> Option<&FieldValue> {
        self.shared.schema.get(key).map(|f| &f.default)
    }

    /// Props for every field, in declaration order.
    pub fn props(&self) -> Vec<FieldProp> {
        self.shared
            .schema
            .iter()
            .map(|field| {
                let custom = self.custom(&field.key);
                FieldProp {
                    key: field.key.clone(),
                    value: custom.clone().unwrap_or_else(|| field.default.clone()),
                    default: field.default.clone(),
                    custom,
                }
            })
            .collect()
    }

    /// Committed overrides, without buffered values.
    pub fn overrides(&self) -> Overrides {
        self.shared.state.borrow().overrides.clone()
    }

    /// Whether a debounced commit is waiting.
    pub fn has_pending(&self) -> bool {
        !self.shared.state.borrow().intermediate.is_empty()
    }

    /// Stop syncing: cancel the pending commit and ignore further updates.
    pub fn dispose(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.intermediate.clear();
        self.shared.timer.cancel();
        tracing::debug!("fragments disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.borrow().disposed
    }
}

impl<L: Location + 'static, D: DebounceTimer + 'static> Drop for Fragments<L, D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<L: Location, D: DebounceTimer> Shared<L, D> {
    fn flush(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed || state.intermediate.is_empty() {
                return false;
            }
            let buffered = std::mem::take(&mut state.intermediate);
            for (key, value) in buffered {
                match value {
                    Some(value) => state.overrides.insert(key, value),
                    None => state.overrides.remove(&key),
                };
            }
        }
        self.commit();
        true
    }

    fn commit(&self) -> Option<Navigation> {
        let navigation = {
            let state = self.state.borrow();
            compute_next_url(
                &self.location.href(),
                &self.schema,
                &state.overrides,
                self.keep_defaults,
            )
        }?;
        tracing::debug!(url = %navigation.url, mode = ?navigation.mode, "writing fragment");
        self.location.navigate(&navigation);
        Some(navigation)
    }
}

fn flush_weak<L: Location, D: DebounceTimer>(shared: &Weak<Shared<L, D>>) {
    if let Some(shared) = shared.upgrade() {
        shared.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryLocation;
    use crate::schema::FieldSpec;
    use crate::timer::ManualTimer;

    type TestFragments = Fragments<Rc<MemoryLocation>, Rc<ManualTimer>>;

    fn mount(href: &str, fields: Vec<FieldSpec>) -> (TestFragments, Rc<MemoryLocation>, Rc<ManualTimer>) {
        let location = Rc::new(MemoryLocation::new(href));
        let timer = Rc::new(ManualTimer::new());
        let fragments = Fragments::mount(
            FragmentSchema::new(fields).unwrap(),
            Rc::clone(&location),
            Rc::clone(&timer),
            &FragmentConfig::default(),
        );
        (fragments, location, timer)
    }

    #[test]
    fn test_kind_mismatch_is_ignored() {
        let (fragments, location, _) = mount("/decks/", vec![FieldSpec::new("page", 1)]);
        assert_eq!(
            fragments.set("page", "3"),
            SetOutcome::Ignored(IgnoreReason::KindMismatch)
        );
        assert_eq!(location.write_count(), 0);
    }

    #[test]
    fn test_toggle_requires_list() {
        let (fragments, _, _) = mount("/decks/", vec![FieldSpec::new("page", 1)]);
        assert_eq!(
            fragments.toggle("page", "x"),
            SetOutcome::Ignored(IgnoreReason::NotAList)
        );
        assert_eq!(
            fragments.toggle("nope", "x"),
            SetOutcome::Ignored(IgnoreReason::Undeclared)
        );
    }

    #[test]
    fn test_buffered_value_is_visible_before_commit() {
        let (fragments, location, timer) =
            mount("/cards/", vec![FieldSpec::new("text", "").debounced()]);

        assert_eq!(fragments.set("text", "fire"), SetOutcome::Buffered);
        assert_eq!(fragments.value("text"), Some(FieldValue::from("fire")));
        assert!(fragments.overrides().is_empty());
        assert_eq!(timer.delay(), Some(Duration::from_millis(100)));
        assert_eq!(location.write_count(), 0);
    }

    #[test]
    fn test_flush_commits_and_cancels_timer() {
        let (fragments, location, timer) =
            mount("/cards/", vec![FieldSpec::new("text", "").debounced()]);
        fragments.set("text", "fire");

        assert!(fragments.flush());
        assert!(!timer.is_pending());
        assert_eq!(location.hash(), "#text=fire");
        assert!(!fragments.flush());
    }

    #[test]
    fn test_dispose_cancels_pending_commit() {
        let (fragments, location, timer) =
            mount("/cards/", vec![FieldSpec::new("text", "").debounced()]);
        fragments.set("text", "fire");
        fragments.dispose();

        assert!(!timer.is_pending());
        assert_eq!(
            fragments.set("text", "ice"),
            SetOutcome::Ignored(IgnoreReason::Disposed)
        );
        assert_eq!(location.write_count(), 0);
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (fragments, location, timer) =
            mount("/cards/", vec![FieldSpec::new("text", "").debounced()]);
        fragments.set("text", "fire");
        drop(fragments);

        assert!(!timer.is_pending());
        assert!(!timer.fire());
        assert_eq!(location.write_count(), 0);
    }

    #[test]
    fn test_keep_defaults_stores_default_values() {
        let location = Rc::new(MemoryLocation::new("/decks/"));
        let config = FragmentConfig {
            keep_defaults: true,
            ..FragmentConfig::default()
        };
        let fragments = Fragments::mount(
            FragmentSchema::new([FieldSpec::new("page", 1)]).unwrap(),
            Rc::clone(&location),
            ManualTimer::new(),
            &config,
        );

        assert_eq!(fragments.set("page", 1), SetOutcome::Applied);
        assert!(fragments.is_custom("page"));
        assert_eq!(location.hash(), "#page=1");
    }
}
