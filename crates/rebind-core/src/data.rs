#![forbid(unsafe_code)]

//! Storage node behind every property.
//!
//! # Design
//!
//! A [`PropertyData<T>`] holds exactly one value representation:
//!
//! | Representation | Read cost                         |
//! |----------------|-----------------------------------|
//! | `Literal`      | one clone                         |
//! | `Alias`        | one read of the referenced node   |
//! | `Expression`   | one call of the captured function |
//!
//! Nodes are shared through `Rc`: the owning property holds one handle and
//! every alias or expression that captured the node holds another, so a node
//! outlives its owner for as long as anything still reads it. Values are
//! never cached; every `value()` walks the representation again.
//!
//! # Invariants
//!
//! 1. At most one property is recorded as `owner` at any time.
//! 2. Replacing the representation discards the previous one entirely.
//! 3. `value()` holds no `RefCell` borrow while evaluating referenced nodes,
//!    so nested reads of other nodes never conflict.
//!
//! # Failure Modes
//!
//! - **Cycle**: a node whose representation reads itself (directly or through
//!   other nodes) recurses until the stack overflows. Forming such a cycle is
//!   a caller error; the checked binding operations on
//!   [`BasicProperty`](crate::BasicProperty) detect the notifier-level cycles
//!   that usually accompany it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::property::PropertyId;

/// Shared handle to a storage node.
pub(crate) type SharedData<T> = Rc<PropertyData<T>>;

/// Type-erased zero-argument computation.
pub(crate) type Evaluator<T> = Rc<dyn Fn() -> T>;

/// The kind of representation a storage node currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReprKind {
    /// A concrete value.
    Literal,
    /// Read-through to another node of the same type.
    Alias,
    /// A lazily evaluated computation over other nodes or captured values.
    Expression,
}

enum Repr<T> {
    Literal(T),
    Alias(SharedData<T>),
    Expression(Evaluator<T>),
}

impl<T> Repr<T> {
    fn kind(&self) -> ReprKind {
        match self {
            Self::Literal(_) => ReprKind::Literal,
            Self::Alias(_) => ReprKind::Alias,
            Self::Expression(_) => ReprKind::Expression,
        }
    }
}

/// One value representation plus its ownership record.
pub(crate) struct PropertyData<T> {
    repr: RefCell<Repr<T>>,
    owner: Cell<Option<PropertyId>>,
}

impl<T: Clone + 'static> PropertyData<T> {
    /// New node holding a literal.
    pub(crate) fn literal(value: T, owner: Option<PropertyId>) -> SharedData<T> {
        Self::with_repr(Repr::Literal(value), owner)
    }

    /// New node reading through `target`.
    pub(crate) fn alias(target: SharedData<T>, owner: Option<PropertyId>) -> SharedData<T> {
        Self::with_repr(Repr::Alias(target), owner)
    }

    /// New node evaluating `eval` on every read.
    pub(crate) fn expression(eval: Evaluator<T>, owner: Option<PropertyId>) -> SharedData<T> {
        Self::with_repr(Repr::Expression(eval), owner)
    }

    fn with_repr(repr: Repr<T>, owner: Option<PropertyId>) -> SharedData<T> {
        Rc::new(Self {
            repr: RefCell::new(repr),
            owner: Cell::new(owner),
        })
    }

    /// Evaluate the current representation.
    pub(crate) fn value(&self) -> T {
        let next = {
            let repr = self.repr.borrow();
            match &*repr {
                Repr::Literal(value) => return value.clone(),
                Repr::Alias(target) => Next::Node(Rc::clone(target)),
                Repr::Expression(eval) => Next::Eval(Rc::clone(eval)),
            }
        };
        match next {
            Next::Node(target) => target.value(),
            Next::Eval(eval) => eval(),
        }
    }

    pub(crate) fn set_literal(&self, value: T) {
        self.replace(Repr::Literal(value));
    }

    pub(crate) fn set_expression(&self, eval: Evaluator<T>) {
        self.replace(Repr::Expression(eval));
    }

    /// Whether reading this node walks through `target` by alias links alone
    /// (or is `target`).
    pub(crate) fn reads_through(&self, target: &SharedData<T>) -> bool {
        if std::ptr::eq(self, Rc::as_ptr(target)) {
            return true;
        }
        let next = match &*self.repr.borrow() {
            Repr::Alias(next) => Rc::clone(next),
            _ => return false,
        };
        next.reads_through(target)
    }

    /// Snapshot the current value into a literal.
    pub(crate) fn freeze(&self) {
        if self.kind() != ReprKind::Literal {
            let value = self.value();
            self.set_literal(value);
        }
    }

    fn replace(&self, repr: Repr<T>) {
        // Drop the old representation after the borrow ends: releasing the
        // last handle of a captured node may run arbitrary drop code.
        let _old = self.repr.replace(repr);
    }
}

impl<T> PropertyData<T> {
    pub(crate) fn kind(&self) -> ReprKind {
        self.repr.borrow().kind()
    }

    pub(crate) fn owner(&self) -> Option<PropertyId> {
        self.owner.get()
    }

    pub(crate) fn set_owner(&self, owner: Option<PropertyId>) {
        self.owner.set(owner);
    }

    pub(crate) fn is_owned_by(&self, id: PropertyId) -> bool {
        self.owner.get() == Some(id)
    }
}

enum Next<T> {
    Node(SharedData<T>),
    Eval(Evaluator<T>),
}

impl<T> fmt::Debug for PropertyData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyData")
            .field("kind", &self.kind())
            .field("owner", &self.owner())
            .finish()
    }
}
