//! End-to-end propagation scenarios: mixed-type graphs of copies, converted
//! copies, and bound expressions driven by writes to a single source.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rebind_core::{BindAnd, BindOr, BindingContext, Flow, Property, ReadOnly};

fn record<T: Clone + 'static, const W: bool>(
    p: &rebind_core::BasicProperty<T, W>,
) -> Rc<RefCell<Option<T>>> {
    let last = Rc::new(RefCell::new(Some(p.value())));
    let sink = Rc::clone(&last);
    p.on_value_changed(move |v| *sink.borrow_mut() = Some(v));
    last
}

fn seen<T: Clone>(slot: &Rc<RefCell<Option<T>>>) -> T {
    match slot.borrow().as_ref() {
        Some(v) => v.clone(),
        None => panic!("callback never recorded a value"),
    }
}

#[test]
fn mixed_graph_updates_every_callback() {
    let mut a = Property::new(0);
    let b = Property::from_property(&a);
    let c: Property<bool> = Property::from_converted(&b);
    let d: Property<bool> = Property::from_binding(!&b);
    let e: Property<bool> = Property::from_binding((&a + &b).convert());

    let dd = &a + &b;
    let f: Property<bool> = Property::from_binding(dd.convert());

    let g: Property<bool> = Property::from_binding((&a).or(0));
    let h: Property<bool> = Property::from_binding((&a).and(3));
    let i: Property<bool> = Property::from_binding((&d).or(&f));

    let (av, bv) = (record(&a), record(&b));
    let (cv, dv, ev, fv) = (record(&c), record(&d), record(&e), record(&f));
    let (gv, hv, iv) = (record(&g), record(&h), record(&i));

    assert_eq!(seen(&av), 0);
    assert_eq!(seen(&bv), 0);
    assert!(!seen(&cv));
    assert!(seen(&dv));
    assert!(!seen(&ev));
    assert!(!seen(&fv));
    assert!(!seen(&gv));
    assert!(!seen(&hv));
    assert!(seen(&iv));

    a.set_value(8);

    assert_eq!(seen(&av), 8);
    assert_eq!(seen(&bv), 8);
    assert!(seen(&cv));
    assert!(!seen(&dv));
    assert!(seen(&ev));
    assert!(seen(&fv));
    assert!(seen(&gv));
    assert!(seen(&hv));
    assert!(seen(&iv));
}

#[test]
fn bool_seeded_from_integer_then_rebound() {
    let a = Property::new(1);
    let b = Property::new(2);
    let mut d: Property<bool> = Property::converted(0);
    assert!(!d.value());

    d.set_converted(4);
    assert!(d.value());

    let a_is_3 = (&a).binding().map(|v| v == 3);
    assert!(!a_is_3.value());

    let mut aaa = Property::from_property(&a);
    aaa.bind(a_is_3.convert());
    assert_eq!(aaa.value(), 0);

    d.bind((&a + &b).convert());
    assert!(d.value());
}

#[test]
fn readonly_chain() {
    let a: ReadOnly<i32> = ReadOnly::new(3);
    assert_eq!(a.value(), 3);
    let mut b = Property::from_property(&a);
    assert_eq!(b.value(), 3);
    let c: Property<bool> = Property::from_converted(&a);
    assert!(c.value());
    b.set_value(6);
    assert_eq!(b.value(), 6);
    assert_eq!(a.value(), 3);
}

#[test]
fn callbacks_fire_once_per_mutation_in_dependency_order() {
    let mut a = Property::new(1);
    let b = Property::from_binding(&a * 2);
    let c = Property::from_binding(&a + &b);
    let log = Rc::new(RefCell::new(Vec::new()));

    for (name, p) in [("a", &a), ("b", &b), ("c", &c)] {
        let log = Rc::clone(&log);
        p.on_value_changed(move |v| log.borrow_mut().push((name, v)));
    }

    a.set_value(5);
    assert_eq!(*log.borrow(), vec![("a", 5), ("b", 10), ("c", 15)]);
}

#[test]
fn dependent_waits_for_every_input() {
    let mut a = Property::new(1);
    let mut x = Property::new(0);
    let c = Property::from_binding(&a + &x);
    x.bind(&a * 2);
    let log = Rc::new(RefCell::new(Vec::new()));

    for (name, p) in [("a", &a), ("x", &x), ("c", &c)] {
        let log = Rc::clone(&log);
        p.on_value_changed(move |v| log.borrow_mut().push((name, v)));
    }

    a.set_value(5);
    assert_eq!(*log.borrow(), vec![("a", 5), ("x", 10), ("c", 15)]);
}

#[test]
fn observer_scope_ends_with_context() {
    let mut source = Property::new(0);
    let total = Rc::new(Cell::new(0));

    {
        let ctx = BindingContext::new();
        let sum = Rc::clone(&total);
        source.on_value_changed_while(ctx.token(), move |v| sum.set(sum.get() + v));
        source.set_value(2);
        source.set_value(3);
    }

    source.set_value(100);
    assert_eq!(total.get(), 5);
    assert_eq!(source.observer_count(), 0);
}

#[test]
fn observer_may_unregister_itself() {
    let mut source = Property::new(0);
    let first_positive = Rc::new(Cell::new(None));
    let slot = Rc::clone(&first_positive);
    source.on_value_changed_until(move |v| {
        if v > 0 {
            slot.set(Some(v));
            Flow::Done
        } else {
            Flow::Continue
        }
    });

    for v in [-1, 0, 4, 9] {
        source.set_value(v);
    }
    assert_eq!(first_positive.get(), Some(4));
}

#[test]
fn dependents_outlive_their_sources() {
    let mut width = Property::new(4);
    let area = Property::from_binding(&width * &width);
    width.set_value(5);
    drop(width);
    assert_eq!(area.value(), 25);
}

#[test]
fn dropped_dependents_are_pruned_on_next_write() {
    let mut source = Property::new(0);
    {
        let _a = Property::from_property(&source);
        let _b = Property::from_binding(&source + 1);
        assert_eq!(source.dependent_count(), 2);
    }
    source.set_value(1);
    assert_eq!(source.dependent_count(), 0);
}

#[test]
fn moved_property_keeps_graph_position() {
    let mut source = Property::new(1);
    let middle = Property::from_binding(&source + 1);
    let sink = Property::from_property(&middle);
    let moved = Property::take(middle);

    let hits = Rc::new(Cell::new(0));
    let probe = Rc::clone(&hits);
    moved.on_changed(move || probe.set(probe.get() + 1));

    source.set_value(10);
    assert_eq!(moved.value(), 11);
    assert_eq!(sink.value(), 11);
    assert_eq!(hits.get(), 1);
}
