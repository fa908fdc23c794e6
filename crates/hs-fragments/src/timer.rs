//! Cancellable one-shot timer used to debounce fragment writes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Callback run when a debounce timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// A single restartable timer.
pub trait DebounceTimer {
    /// Run `callback` after `delay`, cancelling whatever was scheduled before.
    fn start(&self, delay: Duration, callback: TimerCallback);

    /// Drop the scheduled callback, if any.
    fn cancel(&self);

    /// Whether a callback is scheduled.
    fn is_pending(&self) -> bool;
}

impl<T: DebounceTimer + ?Sized> DebounceTimer for Rc<T> {
    fn start(&self, delay: Duration, callback: TimerCallback) {
        (**self).start(delay, callback)
    }

    fn cancel(&self) {
        (**self).cancel()
    }

    fn is_pending(&self) -> bool {
        (**self).is_pending()
    }
}

/// Timer that only fires when told to.
#[derive(Default)]
pub struct ManualTimer {
    scheduled: RefCell<Option<(Duration, TimerCallback)>>,
    starts: Cell<usize>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the scheduled callback now. Returns `false` if nothing was scheduled.
    pub fn fire(&self) -> bool {
        let scheduled = self.scheduled.borrow_mut().take();
        match scheduled {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Delay of the scheduled callback.
    pub fn delay(&self) -> Option<Duration> {
        self.scheduled.borrow().as_ref().map(|(delay, _)| *delay)
    }

    /// How many times `start` was called.
    pub fn starts(&self) -> usize {
        self.starts.get()
    }
}

impl DebounceTimer for ManualTimer {
    fn start(&self, delay: Duration, callback: TimerCallback) {
        self.starts.set(self.starts.get() + 1);
        *self.scheduled.borrow_mut() = Some((delay, callback));
    }

    fn cancel(&self) {
        self.scheduled.borrow_mut().take();
    }

    fn is_pending(&self) -> bool {
        self.scheduled.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_replaces_callback() {
        let timer = ManualTimer::new();
        let fired = Rc::new(Cell::new(0));

        for n in 1..=3 {
            let fired = Rc::clone(&fired);
            timer.start(Duration::from_millis(100), Box::new(move || fired.set(n)));
        }

        assert!(timer.is_pending());
        assert_eq!(timer.starts(), 3);
        assert!(timer.fire());
        assert_eq!(fired.get(), 3);
        assert!(!timer.fire());
    }

    #[test]
    fn test_cancel() {
        let timer = ManualTimer::new();
        timer.start(Duration::from_millis(5), Box::new(|| panic!("cancelled timer fired")));
        assert_eq!(timer.delay(), Some(Duration::from_millis(5)));
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.fire());
    }
}
