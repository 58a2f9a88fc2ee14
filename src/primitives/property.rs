// ============================================================================
// propcell - Property
// The primary typed facade over a reactive cell
// ============================================================================

use std::any::TypeId;
use std::rc::Rc;

use crate::core::error::BindingError;
use crate::core::types::{CellCore, CellData, EqualsFn, Observable};
use crate::primitives::bind::Binding;
use crate::primitives::handler::ChangeHandler;
use crate::reactivity::binding::{install_binding, remove_binding, UntypedBinding};
use crate::reactivity::equality;
use crate::reactivity::notify::notify_observers;
use crate::reactivity::tracking::register_read;

// =============================================================================
// SHARED CELL PATHS
// =============================================================================
//
// The read and write paths are shared with the alias facade, which runs the
// same operations against a forwarded cell.
// =============================================================================

/// The full read path: lazy evaluation, dependency capture, value clone.
pub(crate) fn read_cell<T: Clone + 'static>(cell: &Rc<CellData<T>>) -> T {
    if let Some(binding) = cell.core().binding() {
        if cell.core().is_dirty() {
            binding.evaluate(&**cell);
        }
    }
    register_read(cell.core());
    cell.get()
}

/// The full write path: drop any binding, compare-and-store, notify.
pub(crate) fn write_cell<T: 'static>(cell: &Rc<CellData<T>>, value: T) -> bool {
    remove_binding(cell.core());
    let changed = cell.replace(value);
    if changed {
        notify_observers(cell.core());
    }
    changed
}

// =============================================================================
// PROPERTY<T>
// =============================================================================

/// A reactive cell holding a value of type T, either stored directly or
/// computed by a [`Binding`].
///
/// Reading a property inside a binding expression registers it as a
/// dependency of that binding; writing it notifies every observer and
/// invalidates dependent bindings, which re-evaluate lazily on their next
/// read.
///
/// The handle is cheap to clone; all clones address the same cell, and the
/// cell lives as long as any handle (or alias-independent reference) does.
///
/// # Example
///
/// ```
/// use propcell::{bind, Property};
///
/// let base = Property::new(2);
/// let tripled = Property::new(0);
/// let b = base.clone();
/// tripled.set_binding(bind(move || b.value() * 3));
///
/// assert_eq!(tripled.value(), 6);
/// base.set_value(5);
/// assert_eq!(tripled.value(), 15);
/// ```
pub struct Property<T> {
    cell: Rc<CellData<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Create a property with an initial value, using `PartialEq` to detect
    /// changes.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self {
            cell: CellData::new(value),
        }
    }

    /// Create a property with a custom change-detection function.
    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            cell: CellData::new_with_equals(value, equals),
        }
    }

    /// Create a property whose value type has no usable equality: every
    /// write notifies.
    pub fn new_always_notify(value: T) -> Self {
        Self::new_with_equals(value, equality::never_equals)
    }

    /// Create a property computed by `binding` from the start. The value is
    /// `T::default()` until the first read evaluates.
    pub fn from_binding(binding: Binding<T>) -> Self
    where
        T: Default + PartialEq,
    {
        let property = Self::new(T::default());
        property.set_binding(binding);
        property
    }

    /// Read the current value, evaluating first if a dependency changed
    /// since the last evaluation.
    pub fn value(&self) -> T {
        read_cell(&self.cell)
    }

    /// Write a value directly. Any binding is dropped; observers fire when
    /// the value actually changed. Returns whether it did.
    pub fn set_value(&self, value: T) -> bool {
        write_cell(&self.cell, value)
    }

    /// Attach a binding, returning the previous one. The cell is
    /// invalidated and observers run; evaluation waits for the next read.
    pub fn set_binding(&self, binding: Binding<T>) -> Option<Binding<T>> {
        install_binding(self.cell.core(), binding.data().clone()).map(Binding::from_data)
    }

    /// Attach a type-erased binding. Returns false (changing nothing) when
    /// the binding's value type is not T.
    pub fn set_binding_untyped(&self, binding: &UntypedBinding) -> bool {
        if binding.value_type() != TypeId::of::<T>() {
            return false;
        }
        install_binding(self.cell.core(), binding.data().clone());
        true
    }

    /// Detach and return the binding, leaving the last-evaluated value in
    /// place.
    pub fn take_binding(&self) -> Option<Binding<T>> {
        remove_binding(self.cell.core()).map(Binding::from_data)
    }

    /// The currently attached binding, if any.
    pub fn binding(&self) -> Option<Binding<T>> {
        self.cell.core().binding().map(Binding::from_data)
    }

    pub fn has_binding(&self) -> bool {
        self.cell.core().has_binding()
    }

    /// The error recorded by the attached binding's last evaluation.
    pub fn error(&self) -> Option<BindingError> {
        self.cell.core().binding().and_then(|b| b.error())
    }

    /// Install a change handler. It fires on every notification until the
    /// returned handle is dropped or detached.
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

    pub(crate) fn cell(&self) -> &Rc<CellData<T>> {
        &self.cell
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable for Property<T> {
    fn observed_core(&self) -> Rc<CellCore> {
        self.cell.core().clone()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Shows the stored value without forcing an evaluation.
        self.cell.with(|value| {
            f.debug_struct("Property")
                .field("value", value)
                .field("dirty", &self.cell.core().is_dirty())
                .field("has_binding", &self.cell.core().has_binding())
                .finish()
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
