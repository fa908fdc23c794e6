//! Browser bindings: History API, `setTimeout` and the `hashchange` event.

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::Timeout;
use hs_core::FragmentConfig;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::FragmentError;
use crate::location::Location;
use crate::navigation::{Navigation, NavigationMode};
use crate::schema::FragmentSchema;
use crate::sync::Fragments;
use crate::timer::{DebounceTimer, TimerCallback};

fn js_error(err: JsValue) -> FragmentError {
    FragmentError::Browser(format!("{:?}", err))
}

/// `window.location` read through `href`, written through the History API.
#[derive(Debug, Clone)]
pub struct BrowserLocation {
    window: web_sys::Window,
}

impl BrowserLocation {
    pub fn new() -> Result<Self, FragmentError> {
        let window =
            web_sys::window().ok_or_else(|| FragmentError::Browser("no global window".to_string()))?;
        Ok(Self { window })
    }

    pub fn window(&self) -> &web_sys::Window {
        &self.window
    }
}

impl Location for BrowserLocation {
    fn href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn navigate(&self, navigation: &Navigation) {
        let history = match self.window.history() {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(error = ?err, "history API unavailable");
                return;
            }
        };
        let url = Some(navigation.url.as_str());
        let result = match navigation.mode {
            NavigationMode::Push => history.push_state_with_url(&JsValue::NULL, "", url),
            NavigationMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", url),
        };
        if let Err(err) = result {
            tracing::warn!(error = ?err, url = %navigation.url, "failed to write fragment");
        }
    }
}

/// Debounce timer backed by `setTimeout`.
#[derive(Default)]
pub struct GlooDebounce {
    handle: RefCell<Option<Timeout>>,
    pending: Rc<Cell<bool>>,
}

impl DebounceTimer for GlooDebounce {
    fn start(&self, delay: Duration, callback: TimerCallback) {
        self.cancel();
        let pending = Rc::clone(&self.pending);
        pending.set(true);
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            pending.set(false);
            callback();
        });
        *self.handle.borrow_mut() = Some(timeout);
    }

    fn cancel(&self) {
        // Dropping a Timeout clears it.
        self.handle.borrow_mut().take();
        self.pending.set(false);
    }

    fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// A `hashchange` listener on the window, removed on drop.
pub struct HashChangeListener {
    window: web_sys::Window,
    callback: Closure<dyn FnMut(web_sys::HashChangeEvent)>,
}

impl HashChangeListener {
    pub fn new(window: web_sys::Window, mut on_change: impl FnMut() + 'static) -> Result<Self, FragmentError> {
        let callback = Closure::<dyn FnMut(_)>::wrap(Box::new(move |_e: web_sys::HashChangeEvent| {
            on_change();
        }));
        window
            .add_event_listener_with_callback("hashchange", callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(Self { window, callback })
    }
}

impl Drop for HashChangeListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("hashchange", self.callback.as_ref().unchecked_ref());
    }
}

/// Synchronizer bound to the page.
pub type BrowserSync = Fragments<BrowserLocation, GlooDebounce>;

/// A mounted browser synchronizer and its `hashchange` listener.
///
/// Dropping it detaches the listener and cancels any pending commit.
pub struct BrowserFragments {
    _listener: HashChangeListener,
    fragments: Rc<BrowserSync>,
}

impl BrowserFragments {
    /// Mount on the current page and start listening for external hash changes.
    pub fn mount(schema: FragmentSchema, config: &FragmentConfig) -> Result<Self, FragmentError> {
        let location = BrowserLocation::new()?;
        let window = location.window().clone();
        let fragments = Rc::new(Fragments::mount(schema, location, GlooDebounce::default(), config));

        let weak = Rc::downgrade(&fragments);
        let listener = HashChangeListener::new(window, move || {
            if let Some(fragments) = weak.upgrade() {
                fragments.on_hash_change();
            }
        })?;

        Ok(Self {
            _listener: listener,
            fragments,
        })
    }

    /// A shared handle, e.g. for UI callbacks.
    pub fn handle(&self) -> Rc<BrowserSync> {
        Rc::clone(&self.fragments)
    }
}

impl Deref for BrowserFragments {
    type Target = BrowserSync;

    fn deref(&self) -> &Self::Target {
        &self.fragments
    }
}

impl std::fmt::Debug for BrowserFragments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserFragments")
            .field("listening", &true)
            .field("disposed", &self.fragments.is_disposed())
            .finish_non_exhaustive()
    }
}

