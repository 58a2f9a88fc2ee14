// ============================================================================
// propcell - Dependency Tracking
// Automatic dependency capture: reads performed during a binding's
// evaluation wire the read cell to the evaluating binding
// ============================================================================

use std::rc::Rc;

use crate::core::context::with_context;
use crate::core::types::{CellCore, Observer};
use crate::reactivity::binding::BindingData;

// =============================================================================
// REGISTER READ
// =============================================================================

/// Record a cell read with the evaluation context.
///
/// Called by every facade read after any lazy evaluation has completed. If a
/// binding is evaluating on this thread and the read cell is not that
/// binding's own target, the cell joins the binding's dependency set and
/// receives a dirty-mark observer for it. Outside of evaluation this is a
/// no-op.
pub fn register_read(cell: &Rc<CellCore>) {
    let Some(binding) = with_context(|ctx| ctx.current_binding()) else {
        return;
    };

    // A binding reading its own cell is the evaluator producing its result,
    // not a dependency.
    if let Some(own) = cell.binding() {
        if Rc::ptr_eq(&own, &binding) {
            return;
        }
    }

    register_dependency(&binding, cell);
}

/// Wire `cell` into `binding`'s dependency set, once per binding-on-cell
/// pair.
pub(crate) fn register_dependency(binding: &Rc<BindingData>, cell: &Rc<CellCore>) {
    if binding.has_dependency(cell) {
        return;
    }
    binding.push_dependency(Rc::downgrade(cell));
    cell.add_observer(Observer::MarkBindingDirty(Rc::downgrade(binding)));
}

// =============================================================================
// TESTS
// =============================================================================
