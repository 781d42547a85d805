#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rebind_core::{BindingContext, Flow, Property};

const MAX_PROPS: usize = 16;

#[derive(Arbitrary, Debug)]
enum Op {
    New(i16),
    Set { idx: u8, value: i16 },
    Copy { idx: u8 },
    BindXor { dst: u8, lhs: u8, rhs: u8 },
    BindPlain { dst: u8, src: u8, value: i16 },
    Assign { dst: u8, src: u8 },
    Take { idx: u8 },
    AssignTaken { dst: u8, src: u8 },
    Drop { idx: u8 },
    Watch { idx: u8, until: bool },
    ResetContext,
    Read { idx: u8 },
}

fn pick(props: &[Property<i64>], idx: u8) -> Option<usize> {
    (!props.is_empty()).then(|| usize::from(idx) % props.len())
}

fuzz_target!(|ops: Vec<Op>| {
    let mut props: Vec<Property<i64>> = Vec::new();
    let mut ctx = BindingContext::new();
    let fired = Rc::new(Cell::new(0u64));

    for op in ops.into_iter().take(256) {
        match op {
            Op::New(v) if props.len() < MAX_PROPS => props.push(Property::new(i64::from(v))),
            Op::Set { idx, value } => {
                if let Some(i) = pick(&props, idx) {
                    props[i].set_value(i64::from(value));
                    assert_eq!(props[i].value(), i64::from(value));
                }
            }
            Op::Copy { idx } if props.len() < MAX_PROPS => {
                if let Some(i) = pick(&props, idx) {
                    let copy = Property::from_property(&props[i]);
                    assert_eq!(copy.value(), props[i].value());
                    props.push(copy);
                }
            }
            Op::BindXor { dst, lhs, rhs } => {
                if let (Some(d), Some(l), Some(r)) =
                    (pick(&props, dst), pick(&props, lhs), pick(&props, rhs))
                {
                    let expr = &props[l] ^ &props[r];
                    let _ = props[d].try_bind(expr);
                }
            }
            Op::BindPlain { dst, src, value } => {
                if let (Some(d), Some(s)) = (pick(&props, dst), pick(&props, src)) {
                    let expr = i64::from(value) - &props[s];
                    let _ = props[d].try_bind(expr);
                }
            }
            Op::Assign { dst, src } => {
                if let (Some(d), Some(s)) = (pick(&props, dst), pick(&props, src)) {
                    if d != s {
                        let source = Property::from_property(&props[s]);
                        let _ = props[d].try_assign_property(&source);
                        props.push(source);
                    }
                }
            }
            Op::Take { idx } => {
                if let Some(i) = pick(&props, idx) {
                    let before = props[i].value();
                    let moved = Property::take(props.swap_remove(i));
                    assert_eq!(moved.value(), before);
                    props.push(moved);
                }
            }
            Op::AssignTaken { dst, src } => {
                if let (Some(d), Some(s)) = (pick(&props, dst), pick(&props, src)) {
                    if d != s && props.len() > 1 {
                        let source = props.swap_remove(s);
                        let d = if d == props.len() { s } else { d };
                        let expected = source.value();
                        props[d].assign_taken(source);
                        assert_eq!(props[d].value(), expected);
                    }
                }
            }
            Op::Drop { idx } => {
                if let Some(i) = pick(&props, idx) {
                    drop(props.swap_remove(i));
                }
            }
            Op::Watch { idx, until } => {
                if let Some(i) = pick(&props, idx) {
                    let counter = Rc::clone(&fired);
                    if until {
                        props[i].on_value_changed_until(move |_| {
                            counter.set(counter.get() + 1);
                            Flow::Done
                        });
                    } else {
                        props[i].on_changed_while(ctx.token(), move || {
                            counter.set(counter.get() + 1);
                        });
                    }
                }
            }
            Op::ResetContext => ctx.reset(),
            Op::Read { idx } => {
                if let Some(i) = pick(&props, idx) {
                    let _ = props[i].value();
                }
            }
            _ => {}
        }
        props.truncate(MAX_PROPS);
    }

    for p in &props {
        let _ = p.value();
    }
});
