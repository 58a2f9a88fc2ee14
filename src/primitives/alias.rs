// ============================================================================
// propcell - Alias
// A non-owning facade forwarding every operation to another property's cell
// ============================================================================
//
// The alias holds only a Weak reference to its source, so the source dies on
// its own schedule; a dead source turns reads into defaults and every other
// operation into a no-op.
//
// Handlers installed via the alias attach to the alias's relay core. A
// single ForwardAlias observer on the current source dispatches the relay's
// list whenever the source notifies, which is what keeps those handlers
// firing across set_source retargeting.
// ============================================================================

use std::rc::{Rc, Weak};

use crate::core::types::{CellCore, CellData, Observable, Observer};
use crate::primitives::bind::Binding;
use crate::primitives::handler::ChangeHandler;
use crate::primitives::property::{read_cell, write_cell, Property};
use crate::reactivity::binding::{install_binding, remove_binding, UntypedBinding};

/// A non-owning view of a [`Property`].
///
/// While the source lives, reads, writes, binding operations and observer
/// installs all act on it. Once the source is destroyed, `value()` returns
/// `T::default()`, mutations are no-ops, and [`is_valid`](Self::is_valid)
/// reports false.
///
/// # Example
///
/// ```
/// use propcell::{Alias, Property};
///
/// let alias;
/// {
///     let p = Property::new(3);
///     alias = Alias::new(&p);
///     alias.set_value(7);
///     assert_eq!(p.value(), 7);
/// }
/// assert!(!alias.is_valid());
/// assert_eq!(alias.value(), 0);
/// ```
pub struct Alias<T> {
    source: std::cell::RefCell<Weak<CellData<T>>>,
    relay: Rc<CellCore>,
}

impl<T: Clone + Default + 'static> Alias<T> {
    /// Create an alias of `property`.
    pub fn new(property: &Property<T>) -> Self {
        let alias = Self {
            source: std::cell::RefCell::new(Weak::new()),
            relay: CellCore::new(),
        };
        alias.point_at(property.cell());
        alias
    }

    /// Create an alias resolving to the same cell another alias points at.
    pub fn of_alias(other: &Alias<T>) -> Self {
        let alias = Self {
            source: std::cell::RefCell::new(Weak::new()),
            relay: CellCore::new(),
        };
        if let Some(cell) = other.live() {
            alias.point_at(&cell);
        }
        alias
    }

    fn live(&self) -> Option<Rc<CellData<T>>> {
        self.source.borrow().upgrade()
    }

    fn point_at(&self, cell: &Rc<CellData<T>>) {
        cell.core()
            .add_observer(Observer::ForwardAlias(Rc::downgrade(&self.relay)));
        *self.source.borrow_mut() = Rc::downgrade(cell);
    }

    fn unhook(&self) {
        if let Some(cell) = self.live() {
            cell.core().remove_forward_observer(Rc::as_ptr(&self.relay));
        }
    }

    /// Retarget the alias at a different property. Handlers installed via
    /// this alias keep firing, now for the new source.
    pub fn set_source(&self, property: &Property<T>) {
        self.unhook();
        self.point_at(property.cell());
    }

    /// Whether the aliased cell is still alive.
    pub fn is_valid(&self) -> bool {
        self.live().is_some()
    }

    /// Read through to the source; `T::default()` when the source is gone.
    pub fn value(&self) -> T {
        match self.live() {
            Some(cell) => read_cell(&cell),
            None => T::default(),
        }
    }

    /// Write through to the source. Returns whether the value changed;
    /// always false on a dead source.
    pub fn set_value(&self, value: T) -> bool {
        match self.live() {
            Some(cell) => write_cell(&cell, value),
            None => false,
        }
    }

    /// Attach a binding to the source cell.
    pub fn set_binding(&self, binding: Binding<T>) -> Option<Binding<T>> {
        let cell = self.live()?;
        install_binding(cell.core(), binding.data().clone()).map(Binding::from_data)
    }

    /// Attach a type-erased binding; false on type mismatch or dead source.
    pub fn set_binding_untyped(&self, binding: &UntypedBinding) -> bool {
        match self.live() {
            Some(cell) => {
                if binding.value_type() != std::any::TypeId::of::<T>() {
                    return false;
                }
                install_binding(cell.core(), binding.data().clone());
                true
            }
            None => false,
        }
    }

    /// Detach and return the source's binding.
    pub fn take_binding(&self) -> Option<Binding<T>> {
        let cell = self.live()?;
        remove_binding(cell.core()).map(Binding::from_data)
    }

    pub fn has_binding(&self) -> bool {
        self.live().is_some_and(|cell| cell.core().has_binding())
    }

    /// Install a change handler through the alias. The handler follows the
    /// alias: it keeps firing after [`set_source`](Self::set_source), and
    /// falls silent while the source is dead.
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

impl<T> Observable for Alias<T> {
    fn observed_core(&self) -> Rc<CellCore> {
        self.relay.clone()
    }
}

impl<T> Drop for Alias<T> {
    fn drop(&mut self) {
        if let Some(cell) = self.source.borrow().upgrade() {
            cell.core().remove_forward_observer(Rc::as_ptr(&self.relay));
        }
    }
}

impl<T: std::fmt::Debug + Clone + Default + 'static> std::fmt::Debug for Alias<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alias")
            .field("valid", &self.is_valid())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::bind::bind;
    use std::cell::Cell;

    #[test]
    fn forwards_reads_and_writes() {
        let p = Property::new(3);
        let alias = Alias::new(&p);

        assert_eq!(alias.value(), 3);
        assert!(alias.set_value(7));
        assert_eq!(p.value(), 7);
        assert!(alias.is_valid());
    }

    #[test]
    fn dead_source_defaults_and_noops() {
        let alias;
        {
            let p = Property::new(5);
            alias = Alias::new(&p);
        }
        assert!(!alias.is_valid());
        assert_eq!(alias.value(), 0);
        assert!(!alias.set_value(9));
        assert!(!alias.has_binding());
        assert!(alias.take_binding().is_none());
        assert!(alias.set_binding(bind(|| 1)).is_none());
    }

    #[test]
    fn binding_through_alias() {
        let upstream = Property::new(2);
        let p = Property::new(0);
        let alias = Alias::new(&p);

        let u = upstream.clone();
        alias.set_binding(bind(move || u.value() * 10));
        assert_eq!(p.value(), 20);
        assert!(alias.has_binding());

        let taken = alias.take_binding().unwrap();
        assert!(!p.has_binding());
        p.set_binding(taken);
        assert_eq!(alias.value(), 20);
    }

    #[test]
    fn handler_via_alias_fires_on_source_change() {
        let p = Property::new(0);
        let alias = Alias::new(&p);
        let count = Rc::new(Cell::new(0));
        let count_in = count.clone();
        let _handler = alias.on_value_changed(move || count_in.set(count_in.get() + 1));

        p.set_value(1);
        assert_eq!(count.get(), 1);
        alias.set_value(2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn handler_survives_retargeting() {
        let first = Property::new(0);
        let second = Property::new(0);
        let alias = Alias::new(&first);
        let count = Rc::new(Cell::new(0));
        let count_in = count.clone();
        let _handler = alias.on_value_changed(move || count_in.set(count_in.get() + 1));

        first.set_value(1);
        assert_eq!(count.get(), 1);

        alias.set_source(&second);
        first.set_value(2);
        assert_eq!(count.get(), 1, "old source no longer forwards");
        second.set_value(1);
        assert_eq!(count.get(), 2);
        assert_eq!(alias.value(), 1);
    }

    #[test]
    fn alias_of_alias_resolves_to_cell() {
        let p = Property::new(4);
        let first = Alias::new(&p);
        let second = Alias::of_alias(&first);

        assert_eq!(second.value(), 4);
        second.set_value(6);
        assert_eq!(p.value(), 6);
    }

    #[test]
    fn drop_removes_forward_observer() {
        let p = Property::new(0);
        {
            let _alias = Alias::new(&p);
            assert_eq!(p.observed_core().observer_count(), 1);
        }
        assert_eq!(p.observed_core().observer_count(), 0);
    }

    #[test]
    fn subscribe_through_dead_alias_still_returns_handler() {
        let alias: Alias<i32>;
        {
            let p = Property::new(0);
            alias = Alias::new(&p);
        }
        let count = Rc::new(Cell::new(0));
        let count_in = count.clone();
        let handler = alias.subscribe(move || count_in.set(count_in.get() + 1));
        assert_eq!(count.get(), 1);
        assert!(handler.is_attached(), "attached to the relay, inert until retargeted");
    }
}
