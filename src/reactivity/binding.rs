// ============================================================================
// propcell - Bindings
// The untyped binding object: evaluator, dependency set, sticky error state,
// loop detection
// ============================================================================
//
// A binding is attached to at most one cell (its owner) and writes fresh
// values into that cell's storage through the type-erased evaluator. The
// dependency set records which upstream cells carry a dirty-mark observer
// for this binding; it is rebuilt from scratch on every evaluation, so the
// set always reflects the cells the last run actually read.
// ============================================================================

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::context::with_context;
use crate::core::error::BindingError;
use crate::core::location::SourceLocation;
use crate::core::types::{AnyCell, CellCore};
use crate::reactivity::notify::notify_observers;

// =============================================================================
// BINDING DATA
// =============================================================================

/// Type-erased evaluator. Writes a fresh value into the target cell's
/// storage and reports whether the stored value changed. Failure is a return
/// value; evaluators never unwind into the engine.
pub type BindingEvalFn = Box<dyn Fn(&dyn AnyCell) -> Result<bool, BindingError>>;

/// The reference-counted state of one binding.
///
/// Owned by the cell it is attached to and by any
/// [`UntypedBinding`]/[`Binding`](crate::Binding) handles; all other edges to
/// it are Weak.
pub struct BindingData {
    eval: BindingEvalFn,
    value_type: TypeId,
    location: SourceLocation,

    /// Sticky: cleared only by the next evaluation's outcome.
    error: RefCell<Option<BindingError>>,

    /// True while the evaluator runs. Re-entry means the dependency graph
    /// loops back into this binding.
    evaluating: Cell<bool>,

    /// Upstream cells carrying a dirty-mark observer for this binding,
    /// deduplicated per cell.
    dependencies: RefCell<Vec<Weak<CellCore>>>,

    /// The cell this binding is attached to; None while detached.
    owner: RefCell<Option<Weak<CellCore>>>,

    /// Weak self-reference, so evaluation can register this binding with the
    /// thread-local context from an `&self` method.
    self_ref: Weak<BindingData>,
}

impl BindingData {
    pub fn new(value_type: TypeId, location: SourceLocation, eval: BindingEvalFn) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            eval,
            value_type,
            location,
            error: RefCell::new(None),
            evaluating: Cell::new(false),
            dependencies: RefCell::new(Vec::new()),
            owner: RefCell::new(None),
            self_ref: self_ref.clone(),
        })
    }

    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn error(&self) -> Option<BindingError> {
        self.error.borrow().clone()
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluating.get()
    }

    /// The cell this binding currently computes, if attached and alive.
    pub fn owner_core(&self) -> Option<Rc<CellCore>> {
        self.owner.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies
            .borrow()
            .iter()
            .filter(|w| w.strong_count() != 0)
            .count()
    }

    pub(crate) fn has_dependency(&self, core: &Rc<CellCore>) -> bool {
        let ptr = Rc::as_ptr(core);
        self.dependencies.borrow().iter().any(|w| w.as_ptr() == ptr)
    }

    pub(crate) fn push_dependency(&self, core: Weak<CellCore>) {
        self.dependencies.borrow_mut().push(core);
    }

    /// Remove this binding's dirty-mark observers from every live upstream
    /// cell and forget the dependency set. Reads performed by the next
    /// evaluation rebuild both sides.
    pub(crate) fn release_dependencies(&self) {
        let deps = std::mem::take(&mut *self.dependencies.borrow_mut());
        let me: *const BindingData = self;
        for weak_core in deps {
            if let Some(core) = weak_core.upgrade() {
                core.remove_binding_observer(me);
            }
        }
    }

    pub(crate) fn attach(&self, core: &Rc<CellCore>) {
        *self.owner.borrow_mut() = Some(Rc::downgrade(core));
    }

    pub(crate) fn detach(&self) {
        *self.owner.borrow_mut() = None;
        self.release_dependencies();
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Evaluate this binding into `target`, returning whether the stored
    /// value changed.
    ///
    /// Re-entry (the dependency graph reaching back into this binding while
    /// it evaluates) records a `BindingLoop` error, leaves the cached value
    /// untouched and returns false; the outer evaluation still completes, so
    /// dependents observe a consistent value. The error recorded by such an
    /// inner detection survives the outer run's success and clears only on a
    /// later evaluation that completes without incident.
    pub fn evaluate(&self, target: &dyn AnyCell) -> bool {
        if self.evaluating.get() {
            *self.error.borrow_mut() = Some(BindingError::binding_loop());
            return false;
        }

        // A fresh run decides the error state from scratch.
        *self.error.borrow_mut() = None;

        let frame = EvalFrame::enter(self);
        self.release_dependencies();
        let result = (self.eval)(target);
        drop(frame);

        target.core().set_dirty(false);

        match result {
            Ok(changed) => changed,
            Err(error) => {
                *self.error.borrow_mut() = Some(error);
                false
            }
        }
    }
}

impl Drop for BindingData {
    fn drop(&mut self) {
        self.release_dependencies();
    }
}

/// Evaluation stack frame: registers the binding with the thread-local
/// context for dependency capture and flags it for loop detection. Popping
/// on drop keeps the stack balanced even when the evaluator bails early.
struct EvalFrame<'a> {
    binding: &'a BindingData,
}

impl<'a> EvalFrame<'a> {
    fn enter(binding: &'a BindingData) -> Self {
        binding.evaluating.set(true);
        with_context(|ctx| ctx.push(binding.self_ref.clone()));
        Self { binding }
    }
}

impl Drop for EvalFrame<'_> {
    fn drop(&mut self) {
        with_context(|ctx| ctx.pop());
        self.binding.evaluating.set(false);
    }
}

// =============================================================================
// INSTALL / REMOVE
// =============================================================================

/// Attach `binding` to `core`, detaching and returning any previous binding.
///
/// The cell is marked dirty and its observers run; evaluation stays lazy
/// until the next read.
pub(crate) fn install_binding(
    core: &Rc<CellCore>,
    binding: Rc<BindingData>,
) -> Option<Rc<BindingData>> {
    // A binding computes one cell at a time; installing it elsewhere
    // migrates it away from its previous owner.
    if let Some(prev_owner) = binding.owner_core() {
        if !Rc::ptr_eq(&prev_owner, core) {
            remove_binding(&prev_owner);
        }
    }

    let previous = core.replace_binding(Some(binding.clone()));
    if let Some(old) = &previous {
        old.detach();
    }
    binding.attach(core);
    core.set_dirty(true);
    notify_observers(core);
    previous
}

/// Detach and return the cell's binding. The cell keeps its last-evaluated
/// value and becomes clean (a binding-less cell is never dirty).
pub(crate) fn remove_binding(core: &Rc<CellCore>) -> Option<Rc<BindingData>> {
    let previous = core.replace_binding(None);
    if let Some(old) = &previous {
        old.detach();
    }
    core.set_dirty(false);
    previous
}

// =============================================================================
// UNTYPED HANDLE
// =============================================================================

/// A shareable handle to a binding without its value type.
///
/// This is the currency of dynamic binding transfer: a typed
/// [`Binding`](crate::Binding) erases to this, and installing it on a
/// property re-checks the value type at runtime.
#[derive(Clone)]
pub struct UntypedBinding {
    pub(crate) data: Rc<BindingData>,
}

impl UntypedBinding {
    pub(crate) fn from_data(data: Rc<BindingData>) -> Self {
        Self { data }
    }

    /// Runtime identity of the type this binding produces.
    pub fn value_type(&self) -> TypeId {
        self.data.value_type()
    }

    /// The error recorded by the last evaluation, if any.
    pub fn error(&self) -> Option<BindingError> {
        self.data.error()
    }

    pub fn location(&self) -> SourceLocation {
        self.data.location()
    }

    pub(crate) fn data(&self) -> &Rc<BindingData> {
        &self.data
    }
}

impl std::fmt::Debug for UntypedBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UntypedBinding")
            .field("value_type", &self.data.value_type())
            .field("location", &self.data.location())
            .field("error", &self.data.error())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
