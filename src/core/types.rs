// ============================================================================
// propcell - Core Types
// Cell state, typed storage, and the observer fan-out list
// ============================================================================
//
// A cell splits into two halves:
// - CellCore: the untyped engine state (dirty flag, observer list, owning
//   binding edge). It is its own Rc unit so bindings, handlers and aliases
//   can hold Weak back-edges to it.
// - CellData<T>: the typed value storage wrapping a core. Only reading and
//   writing values needs T; every graph operation goes through the core.
//
// All back-edges (cell -> observer -> binding, alias -> cell) are Weak.
// The only owning edges are facade -> CellData and cell -> binding.
// ============================================================================

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::reactivity::binding::BindingData;

// =============================================================================
// EQUALITY
// =============================================================================

/// Equality function used to decide whether a write changed a cell's value.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Default equality using PartialEq.
pub fn default_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// OBSERVER
// =============================================================================

/// One entry in a cell's observer list.
///
/// The set of variants is closed; each carries exactly the data needed for
/// one dispatch. Payloads are Weak so destruction of either endpoint leaves
/// the entry inert; dead entries are culled during walks and on detach.
#[derive(Clone)]
pub enum Observer {
    /// Mark the binding's owning cell dirty and cascade into its observers.
    MarkBindingDirty(Weak<BindingData>),
    /// Invoke a user change handler.
    InvokeChangeHandler(Weak<HandlerInner>),
    /// Dispatch the observer list of the aliasing cell.
    ForwardAlias(Weak<CellCore>),
}

impl Observer {
    fn is_dead(&self) -> bool {
        match self {
            Observer::MarkBindingDirty(w) => w.strong_count() == 0,
            Observer::InvokeChangeHandler(w) => w.strong_count() == 0,
            Observer::ForwardAlias(w) => w.strong_count() == 0,
        }
    }
}

/// The shared state behind a [`ChangeHandler`](crate::ChangeHandler).
///
/// Owned by the handler facade; the observer list holds only a Weak, so
/// dropping the handler silences it even before the entry is culled.
pub struct HandlerInner {
    callback: Box<dyn Fn()>,
    source: RefCell<Weak<CellCore>>,
}

impl HandlerInner {
    pub(crate) fn new(callback: Box<dyn Fn()>) -> Rc<Self> {
        Rc::new(Self {
            callback,
            source: RefCell::new(Weak::new()),
        })
    }

    pub(crate) fn invoke(&self) {
        (self.callback)()
    }

    pub(crate) fn source(&self) -> Option<Rc<CellCore>> {
        self.source.borrow().upgrade()
    }

    pub(crate) fn set_source(&self, source: Weak<CellCore>) {
        *self.source.borrow_mut() = source;
    }

    pub(crate) fn clear_source(&self) -> Option<Rc<CellCore>> {
        self.source.replace(Weak::new()).upgrade()
    }
}

// =============================================================================
// CELL CORE
// =============================================================================

/// Untyped engine state of one reactive cell.
pub struct CellCore {
    /// True when a dependency of the attached binding changed since the last
    /// evaluation. Invariant: no binding implies not dirty.
    dirty: Cell<bool>,

    /// True while this cell's observer list is being walked. Consulted only
    /// by the alias-forward dispatch path to break forwarding cycles; plain
    /// re-entry (a handler writing back) is permitted.
    notifying: Cell<bool>,

    /// Fan-out list, walked on change notification.
    observers: RefCell<Vec<Observer>>,

    /// Owning edge to the binding computing this cell, if any.
    binding: RefCell<Option<Rc<BindingData>>>,
}

impl CellCore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            dirty: Cell::new(false),
            notifying: Cell::new(false),
            observers: RefCell::new(Vec::new()),
            binding: RefCell::new(None),
        })
    }

    // =========================================================================
    // FLAGS
    // =========================================================================

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.set(dirty);
    }

    pub(crate) fn is_notifying(&self) -> bool {
        self.notifying.get()
    }

    pub(crate) fn set_notifying(&self, notifying: bool) -> bool {
        self.notifying.replace(notifying)
    }

    // =========================================================================
    // BINDING EDGE
    // =========================================================================

    pub fn has_binding(&self) -> bool {
        self.binding.borrow().is_some()
    }

    /// The attached binding, if any.
    pub fn binding(&self) -> Option<Rc<BindingData>> {
        self.binding.borrow().clone()
    }

    pub(crate) fn replace_binding(&self, binding: Option<Rc<BindingData>>) -> Option<Rc<BindingData>> {
        self.binding.replace(binding)
    }

    // =========================================================================
    // OBSERVER LIST
    // =========================================================================

    pub(crate) fn add_observer(&self, observer: Observer) {
        self.observers.borrow_mut().push(observer);
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().iter().filter(|o| !o.is_dead()).count()
    }

    /// Snapshot the list for a walk. Entries added afterwards belong to the
    /// next walk, and callbacks may mutate the list freely while the walk
    /// iterates the snapshot.
    pub(crate) fn snapshot_observers(&self) -> Vec<Observer> {
        self.observers.borrow().clone()
    }

    pub(crate) fn cull_dead_observers(&self) {
        self.observers.borrow_mut().retain(|o| !o.is_dead());
    }

    pub(crate) fn remove_binding_observer(&self, binding: *const BindingData) {
        self.observers.borrow_mut().retain(|o| match o {
            Observer::MarkBindingDirty(w) => w.as_ptr() != binding && w.strong_count() != 0,
            _ => true,
        });
    }

    pub(crate) fn remove_handler_observer(&self, handler: *const HandlerInner) {
        self.observers.borrow_mut().retain(|o| match o {
            Observer::InvokeChangeHandler(w) => w.as_ptr() != handler && w.strong_count() != 0,
            _ => true,
        });
    }

    pub(crate) fn remove_forward_observer(&self, target: *const CellCore) {
        self.observers.borrow_mut().retain(|o| match o {
            Observer::ForwardAlias(w) => w.as_ptr() != target && w.strong_count() != 0,
            _ => true,
        });
    }
}

// =============================================================================
// TYPED STORAGE
// =============================================================================

/// Typed value storage for one cell.
///
/// Facades hold `Rc<CellData<T>>`; the engine reaches the storage through
/// [`AnyCell`] and downcasts when a binding evaluator needs to write a fresh
/// value.
pub struct CellData<T> {
    core: Rc<CellCore>,
    value: RefCell<T>,
    equals: EqualsFn<T>,
}

impl<T> CellData<T> {
    pub fn new(value: T) -> Rc<Self>
    where
        T: PartialEq,
    {
        Self::new_with_equals(value, default_equals)
    }

    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Rc<Self> {
        Rc::new(Self {
            core: CellCore::new(),
            value: RefCell::new(value),
            equals,
        })
    }

    pub fn core(&self) -> &Rc<CellCore> {
        &self.core
    }

    /// Clone out the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Access the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Compare-and-store. Returns true if the value changed under this
    /// cell's equality function.
    pub(crate) fn replace(&self, value: T) -> bool {
        let changed = {
            let current = self.value.borrow();
            !(self.equals)(&current, &value)
        };
        if changed {
            *self.value.borrow_mut() = value;
        }
        changed
    }

    /// Store unconditionally, without an equality check.
    pub(crate) fn store(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

// =============================================================================
// TYPE ERASURE
// =============================================================================

/// Type-erased view of a cell, the seam between the untyped engine and the
/// typed storage. Binding evaluators receive their target as `&dyn AnyCell`
/// and downcast through [`AnyCell::as_any`].
pub trait AnyCell: Any {
    /// The engine state of this cell.
    fn core(&self) -> &Rc<CellCore>;

    /// Runtime identity of the stored value type.
    fn value_type(&self) -> TypeId;

    /// Upcast for downcasting to the concrete storage.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AnyCell for CellData<T> {
    fn core(&self) -> &Rc<CellCore> {
        &self.core
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything a change handler can be attached to.
pub trait Observable {
    /// The cell core that hosts observers for this value.
    fn observed_core(&self) -> Rc<CellCore>;
}

// =============================================================================
// TESTS
// =============================================================================
