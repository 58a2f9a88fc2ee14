// ============================================================================
// propcell - Change Handlers
// RAII observers: alive while held, detached on drop
// ============================================================================

use std::rc::Rc;

use crate::core::types::{HandlerInner, Observable, Observer};

/// A change handler attached to a cell's observer list.
///
/// Construction via [`Property::on_value_changed`](crate::Property::on_value_changed)
/// attaches immediately; dropping the handle detaches. A handler can also be
/// built detached and moved between sources with [`attach`](Self::attach) /
/// [`detach`](Self::detach).
///
/// The callback takes no arguments; it reads whatever cells it cares about,
/// which by then hold their new values.
///
/// # Example
///
/// ```
/// use propcell::Property;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let p = Property::new(0);
/// let hits = Rc::new(Cell::new(0));
/// let h = hits.clone();
/// {
///     let _watch = p.on_value_changed(move || h.set(h.get() + 1));
///     p.set_value(1);
/// }
/// // Dropped: later writes are unobserved.
/// p.set_value(2);
/// assert_eq!(hits.get(), 1);
/// ```
pub struct ChangeHandler {
    inner: Rc<HandlerInner>,
}

impl ChangeHandler {
    /// Create a detached handler.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self {
            inner: HandlerInner::new(Box::new(f)),
        }
    }

    /// Attach to `source`, detaching from any previous source first.
    pub fn attach(&self, source: &dyn Observable) {
        self.detach();
        let core = source.observed_core();
        core.add_observer(Observer::InvokeChangeHandler(Rc::downgrade(&self.inner)));
        self.inner.set_source(Rc::downgrade(&core));
    }

    /// Remove this handler from its source's observer list. A no-op when
    /// detached or when the source is already gone.
    pub fn detach(&self) {
        if let Some(core) = self.inner.clear_source() {
            core.remove_handler_observer(Rc::as_ptr(&self.inner));
        }
    }

    /// Whether the handler is attached to a live source.
    pub fn is_attached(&self) -> bool {
        self.inner.source().is_some()
    }
}

impl Drop for ChangeHandler {
    fn drop(&mut self) {
        self.detach();
    }
}

// =============================================================================
// TESTS
// =============================================================================
