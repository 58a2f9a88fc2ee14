// ============================================================================
// propcell - Notification
// The change cascade: dirty-mark propagation and handler dispatch
// ============================================================================
//
// The walk operates on a snapshot of the observer list (collect-then-mutate),
// so callbacks are free to read, write, attach and detach while it runs.
// Observers added during a walk are not visited by that walk.
//
// A dirty-mark dispatch recurses into the dependent cell's own observers
// before moving to the next sibling (depth-first). The recursion fires only
// on the dirty false->true transition, so a subtree that is already
// invalidated is not walked again and cyclic observer graphs terminate.
// ============================================================================

use std::rc::Rc;

use crate::core::types::{CellCore, Observer};

// =============================================================================
// NOTIFY OBSERVERS
// =============================================================================

/// Run a cell's observer list.
///
/// Dirty marks and handler invocations happen inline; binding evaluation is
/// never triggered here. A handler that reads an invalidated cell evaluates
/// it lazily at that point, inside the cascade. The whole cascade completes
/// before the write that started it returns.
pub fn notify_observers(core: &Rc<CellCore>) {
    core.cull_dead_observers();
    let snapshot = core.snapshot_observers();

    let was_notifying = core.set_notifying(true);
    for observer in snapshot {
        dispatch(&observer);
    }
    core.set_notifying(was_notifying);
}

fn dispatch(observer: &Observer) {
    match observer {
        Observer::MarkBindingDirty(binding) => {
            let Some(binding) = binding.upgrade() else { return };
            let Some(owner) = binding.owner_core() else { return };
            if !owner.is_dirty() {
                owner.set_dirty(true);
                notify_observers(&owner);
            }
        }
        Observer::InvokeChangeHandler(handler) => {
            if let Some(handler) = handler.upgrade() {
                handler.invoke();
            }
        }
        Observer::ForwardAlias(target) => {
            let Some(target) = target.upgrade() else { return };
            // Break forwarding cycles: a cell already mid-walk is not
            // re-entered through an alias hop.
            if !target.is_notifying() {
                notify_observers(&target);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
