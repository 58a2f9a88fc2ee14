use propcell::{bind, Alias, ChangeHandler, Observable, Property};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_handler_drop_stops_notifications() {
    let p = Property::new(0);
    let count = Rc::new(Cell::new(0));

    {
        let count_in = count.clone();
        let _handler = p.on_value_changed(move || count_in.set(count_in.get() + 1));
        p.set_value(1);
        assert_eq!(count.get(), 1);
        // _handler drops here and detaches itself.
    }

    p.set_value(2);
    assert_eq!(count.get(), 1, "handler must not fire after drop");
    assert_eq!(p.observed_core().observer_count(), 0);
}

#[test]
fn test_binding_drop_unlinks_upstream_observers() {
    let upstream = Property::new(1);

    {
        let bound = Property::new(0);
        let u = upstream.clone();
        bound.set_binding(bind(move || u.value()));
        assert_eq!(bound.value(), 1);
        assert_eq!(upstream.observed_core().observer_count(), 1);
        // bound drops here; with it the last reference to its binding.
    }

    assert_eq!(
        upstream.observed_core().observer_count(),
        0,
        "dropped binding must release its dependency observers"
    );

    // Upstream keeps working alone.
    assert!(upstream.set_value(2));
    assert_eq!(upstream.value(), 2);
}

#[test]
fn test_taken_binding_keeps_living_without_its_cell() {
    let upstream = Property::new(5);
    let taken;

    {
        let bound = Property::new(0);
        let u = upstream.clone();
        bound.set_binding(bind(move || u.value() * 2));
        assert_eq!(bound.value(), 10);
        taken = bound.take_binding().unwrap();
        // bound drops here; taken holds the binding alive.
    }

    // The binding is attached to nothing; upstream writes find no owner to
    // mark and stay cheap.
    upstream.set_value(6);
    assert!(taken.error().is_none());

    // Reinstalling on a fresh property revives it.
    let fresh = Property::new(0);
    fresh.set_binding(taken);
    assert_eq!(fresh.value(), 12);
}

#[test]
fn test_dead_cell_leaves_observers_inert() {
    let count = Rc::new(Cell::new(0));
    let count_in = count.clone();
    let handler;

    {
        let p = Property::new(0);
        handler = p.on_value_changed(move || count_in.set(count_in.get() + 1));
        p.set_value(1);
        assert_eq!(count.get(), 1);
        // p drops here.
    }

    // Every operation through the orphaned handler is a no-op.
    assert!(!handler.is_attached());
    handler.detach();
    drop(handler);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_dead_source_invalidates_alias() {
    let alias;
    {
        let p = Property::new(41);
        alias = Alias::new(&p);
        assert!(alias.is_valid());
        assert_eq!(alias.value(), 41);
    }
    assert!(!alias.is_valid());
    assert_eq!(alias.value(), 0);
    assert!(!alias.set_value(1));
}

#[test]
fn test_alias_drop_cleans_source_observer_list() {
    let p = Property::new(0);
    {
        let _alias = Alias::new(&p);
        assert_eq!(p.observed_core().observer_count(), 1);
    }
    assert_eq!(p.observed_core().observer_count(), 0);
}

#[test]
fn test_handler_dropped_inside_its_own_callback() {
    // A handler that removes itself while the walk that invoked it is still
    // running: the snapshot walk must not stumble.
    let p = Property::new(0);
    let count = Rc::new(Cell::new(0));

    let slot: Rc<Cell<Option<ChangeHandler>>> = Rc::new(Cell::new(None));
    let slot_in = slot.clone();
    let count_in = count.clone();
    let handler = p.on_value_changed(move || {
        count_in.set(count_in.get() + 1);
        slot_in.take();
    });
    slot.set(Some(handler));

    p.set_value(1);
    assert_eq!(count.get(), 1);

    p.set_value(2);
    assert_eq!(count.get(), 1, "self-removed handler stays gone");
    assert_eq!(p.observed_core().observer_count(), 0);
}

#[test]
fn test_upstream_dying_before_dependent() {
    let bound = Property::new(0);

    {
        let upstream = Property::new(3);
        let u = upstream.clone();
        bound.set_binding(bind(move || u.value()));
        assert_eq!(bound.value(), 3);
        // upstream's handle drops here, but the binding's closure still
        // holds a clone, so the cell stays alive with it.
    }

    // The captured handle keeps the graph consistent.
    assert_eq!(bound.value(), 3);

    // Replacing the binding releases the last reference to the upstream
    // cell; nothing dangles.
    bound.set_binding(bind(|| 9));
    assert_eq!(bound.value(), 9);
}
