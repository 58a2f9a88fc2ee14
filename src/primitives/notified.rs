// ============================================================================
// propcell - Notified Property
// A property with a fixed owner callback on every mutation, optionally
// gated by a guard that can veto or rewrite candidate values
// ============================================================================

use std::any::TypeId;
use std::rc::Rc;

use crate::core::error::BindingError;
use crate::core::types::{CellCore, CellData, EqualsFn, Observable};
use crate::primitives::bind::Binding;
use crate::primitives::handler::ChangeHandler;
use crate::reactivity::binding::{install_binding, remove_binding, UntypedBinding};
use crate::reactivity::notify::notify_observers;
use crate::reactivity::tracking::register_read;

/// The fixed callback shape, chosen at construction.
enum NotifyCallback<T> {
    /// Receives the value the cell held before the mutation.
    WithOld(Box<dyn Fn(&T)>),
    /// Notification only.
    Plain(Box<dyn Fn()>),
}

/// A property whose every mutation additionally invokes one fixed,
/// owner-provided callback, on top of the ordinary observer dispatch.
///
/// An optional guard runs before direct writes: it can veto the write
/// entirely or, in its mutating form, rewrite the candidate value before it
/// reaches storage. Vetoed writes change nothing and fire nothing.
///
/// Unlike [`Property`](crate::Property) this handle is not cloneable: the
/// callback belongs to a single owner.
///
/// # Example
///
/// ```
/// use propcell::NotifiedProperty;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(Cell::new(-1));
/// let s = seen.clone();
/// let level = NotifiedProperty::new(0, move |old: &i32| s.set(*old))
///     .with_guard(|v| *v >= 0);
///
/// assert!(!level.set_value(-3));
/// assert!(level.set_value(7));
/// assert_eq!(seen.get(), 0); // callback saw the previous value
/// ```
pub struct NotifiedProperty<T> {
    cell: Rc<CellData<T>>,
    callback: NotifyCallback<T>,
    guard: Option<Box<dyn Fn(&mut T) -> bool>>,
}

impl<T: Clone + 'static> NotifiedProperty<T> {
    /// Create with a callback that receives the old value.
    pub fn new(value: T, callback: impl Fn(&T) + 'static) -> Self
    where
        T: PartialEq,
    {
        Self {
            cell: CellData::new(value),
            callback: NotifyCallback::WithOld(Box::new(callback)),
            guard: None,
        }
    }

    /// Create with a notification-only callback.
    pub fn new_notify_only(value: T, callback: impl Fn() + 'static) -> Self
    where
        T: PartialEq,
    {
        Self {
            cell: CellData::new(value),
            callback: NotifyCallback::Plain(Box::new(callback)),
            guard: None,
        }
    }

    /// As [`new`](Self::new) with a custom change-detection function.
    pub fn new_with_equals(value: T, equals: EqualsFn<T>, callback: impl Fn(&T) + 'static) -> Self {
        Self {
            cell: CellData::new_with_equals(value, equals),
            callback: NotifyCallback::WithOld(Box::new(callback)),
            guard: None,
        }
    }

    /// Gate direct writes with a vetoing guard.
    pub fn with_guard(mut self, guard: impl Fn(&T) -> bool + 'static) -> Self {
        self.guard = Some(Box::new(move |value: &mut T| guard(value)));
        self
    }

    /// Gate direct writes with a guard that may also rewrite the candidate
    /// value in place before it reaches storage.
    pub fn with_guard_mut(mut self, guard: impl Fn(&mut T) -> bool + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    fn invoke_callback(&self, old: &T) {
        match &self.callback {
            NotifyCallback::WithOld(f) => f(old),
            NotifyCallback::Plain(f) => f(),
        }
    }

    /// Read the current value. If a binding evaluation updates the cache,
    /// the owner callback observes that mutation too.
    pub fn value(&self) -> T {
        let core = self.cell.core();
        if let Some(binding) = core.binding() {
            if core.is_dirty() {
                let old = self.cell.get();
                if binding.evaluate(&*self.cell) {
                    self.invoke_callback(&old);
                }
            }
        }
        register_read(core);
        self.cell.get()
    }

    /// Write a value directly: guard, then drop any binding, store, notify
    /// observers, and invoke the owner callback. Returns whether the value
    /// changed (false includes guard rejection).
    pub fn set_value(&self, value: T) -> bool {
        let mut value = value;
        if let Some(guard) = &self.guard {
            if !guard(&mut value) {
                return false;
            }
        }

        remove_binding(self.cell.core());
        let old = self.cell.get();
        let changed = self.cell.replace(value);
        if changed {
            notify_observers(self.cell.core());
            self.invoke_callback(&old);
        }
        changed
    }

    /// Attach a binding. The owner callback is invoked for the mutation;
    /// evaluation stays lazy.
    pub fn set_binding(&self, binding: Binding<T>) -> Option<Binding<T>> {
        let old = self.cell.get();
        let previous =
            install_binding(self.cell.core(), binding.data().clone()).map(Binding::from_data);
        self.invoke_callback(&old);
        previous
    }

    /// Attach a type-erased binding; false when the value type is not T.
    pub fn set_binding_untyped(&self, binding: &UntypedBinding) -> bool {
        if binding.value_type() != TypeId::of::<T>() {
            return false;
        }
        let old = self.cell.get();
        install_binding(self.cell.core(), binding.data().clone());
        self.invoke_callback(&old);
        true
    }

    /// Detach and return the binding without invoking the callback; the
    /// stored value does not change.
    pub fn take_binding(&self) -> Option<Binding<T>> {
        remove_binding(self.cell.core()).map(Binding::from_data)
    }

    pub fn has_binding(&self) -> bool {
        self.cell.core().has_binding()
    }

    /// The error recorded by the attached binding's last evaluation.
    pub fn error(&self) -> Option<BindingError> {
        self.cell.core().binding().and_then(|b| b.error())
    }

    /// Install a free-form change handler alongside the fixed callback.
    pub fn on_value_changed(&self, f: impl Fn() + 'static) -> ChangeHandler {
        let handler = ChangeHandler::new(f);
        handler.attach(self);
        handler
    }

    /// Invoke `f` once immediately, then install it as a change handler.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> ChangeHandler {
        f();
        self.on_value_changed(f)
    }
}

impl<T> Observable for NotifiedProperty<T> {
    fn observed_core(&self) -> Rc<CellCore> {
        self.cell.core().clone()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for NotifiedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cell.with(|value| {
            f.debug_struct("NotifiedProperty")
                .field("value", value)
                .field("dirty", &self.cell.core().is_dirty())
                .field("guarded", &self.guard.is_some())
                .finish()
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
