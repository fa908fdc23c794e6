//! URL fragment state for analytics pages.
//!
//! This crate provides:
//! - `FragmentSchema` / `FieldSpec` - Declared fields with typed defaults
//! - `codec` - Fragment parsing and encoding (`parse_fragment`, `cast`, `stringify`)
//! - `compute_next_url` - Where a state change should navigate, if anywhere
//! - `Fragments` - Synchronizer with debounced and immutable fields
//! - `Location` / `DebounceTimer` - Browser seams, with in-memory versions for tests
//!
//! Enable the `web` feature for `BrowserFragments`, which binds to
//! `window.location`, the History API and the `hashchange` event.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use hs_core::FragmentConfig;
//! use hs_fragments::{FieldSpec, FragmentSchema, Fragments, Location, ManualTimer, MemoryLocation};
//!
//! let schema = FragmentSchema::new([
//!     FieldSpec::new("sortBy", "popularity"),
//!     FieldSpec::new("page", 1),
//! ])
//! .unwrap();
//! let location = Rc::new(MemoryLocation::new("/decks/#page=3"));
//! let fragments = Fragments::mount(schema, Rc::clone(&location), ManualTimer::new(), &FragmentConfig::default());
//!
//! fragments.set("sortBy", "winrate");
//! assert_eq!(location.hash(), "#page=3&sortBy=winrate");
//! ```

pub mod codec;
mod error;
mod location;
mod navigation;
mod schema;
mod sync;
mod timer;

#[cfg(feature = "web")]
mod web;

pub use codec::{cast, decode_overrides, encode_fragment, parse_fragment, stringify, RawPair};
pub use error::FragmentError;
pub use location::{Location, MemoryLocation};
pub use navigation::{compute_next_url, split_url, Navigation, NavigationMode};
pub use schema::*;
pub use sync::*;
pub use timer::{DebounceTimer, ManualTimer, TimerCallback};

#[cfg(feature = "web")]
pub use web::{BrowserFragments, BrowserLocation, BrowserSync, GlooDebounce, HashChangeListener};
