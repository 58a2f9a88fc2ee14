use propcell::{bind, BindingErrorKind, Observable, Property};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_write_cascade_completes_before_returning() {
    let a = Property::new(1);
    let b = Property::new(0);
    let c = Property::new(0);

    let a_in = a.clone();
    b.set_binding(bind(move || a_in.value() + 1));
    let b_in = b.clone();
    c.set_binding(bind(move || b_in.value() + 1));
    assert_eq!(c.value(), 3);

    let fired = Rc::new(Cell::new(false));
    let fired_in = fired.clone();
    let _handler = c.on_value_changed(move || fired_in.set(true));

    a.set_value(10);
    // The handler already ran; nothing is deferred.
    assert!(fired.get());
    assert!(b.observed_core().is_dirty());
    assert!(c.observed_core().is_dirty());
}

#[test]
fn test_cascade_is_depth_first() {
    // a feeds b (bound) and carries a plain handler. The dependent's
    // observers run before the walk returns to a's next sibling entry.
    let order = Rc::new(RefCell::new(Vec::new()));

    let a = Property::new(0);
    let b = Property::new(0);
    let a_in = a.clone();
    b.set_binding(bind(move || a_in.value()));
    let _ = b.value();

    let order_in = order.clone();
    let _on_b = b.on_value_changed(move || order_in.borrow_mut().push("dependent"));
    let order_in = order.clone();
    let _on_a = a.on_value_changed(move || order_in.borrow_mut().push("sibling"));

    a.set_value(1);
    assert_eq!(*order.borrow(), vec!["dependent", "sibling"]);
}

#[test]
fn test_invalidation_does_not_evaluate() {
    let runs = Rc::new(Cell::new(0));
    let a = Property::new(1);
    let b = Property::new(0);

    let a_in = a.clone();
    let runs_in = runs.clone();
    b.set_binding(bind(move || {
        runs_in.set(runs_in.get() + 1);
        a_in.value()
    }));
    assert_eq!(b.value(), 1);
    assert_eq!(runs.get(), 1);

    a.set_value(2);
    a.set_value(3);
    a.set_value(4);
    assert_eq!(runs.get(), 1, "writes only mark dirty");
    assert_eq!(b.value(), 4);
    assert_eq!(runs.get(), 2, "one evaluation folds three writes");
}

#[test]
fn test_second_write_while_dirty_notifies_once() {
    let a = Property::new(0);
    let b = Property::new(0);
    let a_in = a.clone();
    b.set_binding(bind(move || a_in.value()));
    let _ = b.value();

    let count = Rc::new(Cell::new(0));
    let count_in = count.clone();
    let _handler = b.on_value_changed(move || count_in.set(count_in.get() + 1));

    a.set_value(1);
    a.set_value(2);
    assert_eq!(
        count.get(),
        1,
        "a still-dirty dependent is not re-notified"
    );

    // Reading re-arms the notification.
    assert_eq!(b.value(), 2);
    a.set_value(3);
    assert_eq!(count.get(), 2);
}

#[test]
fn test_diamond_converges_with_single_read() {
    let a = Property::new(1);
    let b = Property::new(0);
    let c = Property::new(0);
    let d = Property::new(0);

    let a_in = a.clone();
    b.set_binding(bind(move || a_in.value() + 1));
    let a_in = a.clone();
    c.set_binding(bind(move || a_in.value() + 2));
    let (b_in, c_in) = (b.clone(), c.clone());
    d.set_binding(bind(move || b_in.value() + c_in.value()));

    assert_eq!(d.value(), 5);
    a.set_value(10);
    assert_eq!(d.value(), 23);
}

#[test]
fn test_cycle_is_contained() {
    let a = Property::new(1);
    let b = Property::new(2);

    let b_in = b.clone();
    a.set_binding(bind(move || b_in.value() + 1));
    assert_eq!(a.value(), 3);

    let a_in = a.clone();
    b.set_binding(bind(move || a_in.value() + 1));
    let _ = b.value();

    // The binding that closed the cycle reports the loop; reads terminate
    // and repeat identically.
    assert_eq!(
        b.error().map(|e| e.kind()),
        Some(BindingErrorKind::BindingLoop)
    );
    let snapshot = (a.value(), b.value());
    assert_eq!((a.value(), b.value()), snapshot);
}

#[test]
fn test_loop_error_does_not_propagate_to_dependents() {
    let looped = Property::new(0);
    let dependent = Property::new(0);

    let l = looped.clone();
    looped.set_binding(bind(move || l.value() + 1));
    let _ = looped.value();
    assert!(looped.error().is_some());

    let l = looped.clone();
    dependent.set_binding(bind(move || l.value() * 2));
    let _ = dependent.value();

    // The dependent sees a stale-but-consistent value and no error of its
    // own; the upstream failure is visible only on the upstream binding.
    assert!(dependent.error().is_none());
    assert_eq!(dependent.value() % 2, 0);
}

#[test]
fn test_deep_chain_propagates() {
    let root = Property::new(0);
    let mut tail = root.clone();
    for _ in 0..64 {
        let next = Property::new(0);
        let prev = tail.clone();
        next.set_binding(bind(move || prev.value() + 1));
        tail = next;
    }

    assert_eq!(tail.value(), 64);
    root.set_value(100);
    assert_eq!(tail.value(), 164);
}

#[test]
fn test_handler_attached_mid_cascade_waits_for_next_write() {
    let a = Property::new(0);
    let late_count = Rc::new(Cell::new(0));

    let handler_slot: Rc<RefCell<Option<propcell::ChangeHandler>>> =
        Rc::new(RefCell::new(None));

    let (a_in, slot_in, late_in) = (a.clone(), handler_slot.clone(), late_count.clone());
    let _installer = a.on_value_changed(move || {
        if slot_in.borrow().is_none() {
            let late = late_in.clone();
            let handler = a_in.on_value_changed(move || late.set(late.get() + 1));
            *slot_in.borrow_mut() = Some(handler);
        }
    });

    a.set_value(1);
    assert_eq!(late_count.get(), 0, "snapshot walk skips late additions");

    a.set_value(2);
    assert_eq!(late_count.get(), 1);
}
