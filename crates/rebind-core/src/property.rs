#![forbid(unsafe_code)]

//! Observable typed properties.
//!
//! # Design
//!
//! A [`BasicProperty`] couples three things:
//!
//! - a stable [`PropertyId`] used as the ownership key of storage nodes;
//! - a *slot*: a shared cell pointing at the storage node the property
//!   currently reads. Binding expressions and value callbacks capture the
//!   slot, so they always read whatever node the property uses now;
//! - a [`BindingNotifier`] for change propagation.
//!
//! Copy construction ([`from_property`](BasicProperty::from_property)) shares
//! the source's node instead of copying the value. Before sharing, the source
//! is *unshared*: if it was itself only aliasing another property's node, it
//! first takes ownership of a fresh node that reads through the old one. The
//! copy then follows the source until either side is written directly.
//!
//! # Invariants
//!
//! 1. A node records at most one owner. Only the owner writes literals into
//!    the node in place; any other writer allocates a fresh node.
//! 2. A shared node abandoned by its owner on reassignment is rewritten to
//!    read through the property, so every sharer keeps tracking it.
//! 3. On drop, whatever the property exposes is frozen to its current value:
//!    an owned node in place, otherwise the slot, if anything still reads it.
//!    Readers that outlive the property observe the last value it had and
//!    never follow a source they hold no notifier edge from.
//! 4. Every mutation finishes with exactly one propagation pass.
//!
//! # Failure Modes
//!
//! - **Value cycle**: binding a property to an expression that reads the
//!   property itself (directly or through other properties) recurses on the
//!   next read. [`try_bind`](BasicProperty::try_bind) and
//!   [`try_assign_property`](Property::try_assign_property) reject the
//!   notifier cycles that accompany such bindings; the unchecked operations
//!   do not.
//! - **Panicking value types**: a panic raised while evaluating (division by
//!   zero, overflow in debug builds) propagates to the reader. Dropping an
//!   owning property evaluates its expression one last time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::binding::Binding;
use crate::calc::{Convert, Identity};
use crate::data::{PropertyData, ReprKind, SharedData};
use crate::dispatch;
use crate::error::{BindError, Result};
use crate::notifier::{BindingNotifier, Flow, Liveness, NotifierRef};

/// Bound on everything a property can hold.
pub trait Value: Clone + 'static {}

impl<T: Clone + 'static> Value for T {}

static NEXT_PROPERTY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u64);

impl PropertyId {
    fn next() -> Self {
        Self(NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property#{}", self.0)
    }
}

/// The node a property currently reads.
pub(crate) struct Slot<T> {
    node: RefCell<SharedData<T>>,
}

impl<T: Value> Slot<T> {
    fn new(node: SharedData<T>) -> Rc<Self> {
        Rc::new(Self {
            node: RefCell::new(node),
        })
    }

    pub(crate) fn value(&self) -> T {
        let node = self.current();
        node.value()
    }

    fn current(&self) -> SharedData<T> {
        Rc::clone(&self.node.borrow())
    }

    fn replace(&self, node: SharedData<T>) -> SharedData<T> {
        self.node.replace(node)
    }
}

/// Writable property.
pub type Property<T> = BasicProperty<T, true>;

/// Property without direct value writes; it can still be re-seeded through
/// [`bind`](BasicProperty::bind).
///
/// Literal writes do not compile:
///
/// ```compile_fail
/// use rebind_core::ReadOnly;
///
/// let mut r: ReadOnly<i32> = ReadOnly::new(3);
/// r.set_value(6);
/// ```
///
/// Neither does following another property:
///
/// ```compile_fail
/// use rebind_core::{Property, ReadOnly};
///
/// let source = Property::new(1);
/// let mut r: ReadOnly<i32> = ReadOnly::new(3);
/// r.assign_property(&source);
/// ```
pub type ReadOnly<T> = BasicProperty<T, false>;

/// Observable storage cell. See the [module docs](self).
pub struct BasicProperty<T: Value, const WRITABLE: bool> {
    id: PropertyId,
    slot: Rc<Slot<T>>,
    notifier: BindingNotifier,
}

impl<T: Value, const WRITABLE: bool> BasicProperty<T, WRITABLE> {
    fn with_node(make: impl FnOnce(PropertyId) -> SharedData<T>) -> Self {
        let id = PropertyId::next();
        Self {
            id,
            slot: Slot::new(make(id)),
            notifier: BindingNotifier::new(),
        }
    }

    /// Property owning a literal.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_node(|id| PropertyData::literal(value, Some(id)))
    }

    /// Property owning a literal of another value type, converted once.
    ///
    /// ```
    /// use rebind_core::Property;
    ///
    /// let flag: Property<bool> = Property::converted(0);
    /// assert!(!flag.value());
    /// ```
    #[must_use]
    pub fn converted<U: Convert<T>>(value: U) -> Self {
        Self::new(value.convert())
    }

    /// Property that follows `source`: shares its storage node and is
    /// notified whenever `source` changes.
    #[must_use]
    pub fn from_property<const W: bool>(source: &BasicProperty<T, W>) -> Self {
        source.unshare();
        let node = source.slot.current();
        let this = Self::with_node(|_| node);
        this.notifier.depend_on(&source.handle());
        this
    }

    /// Property that follows `source` across a value-type boundary. It owns
    /// a read-through expression converting on every read.
    #[must_use]
    pub fn from_converted<U, const W: bool>(source: &BasicProperty<U, W>) -> Self
    where
        U: Value + Convert<T>,
    {
        Self::from_binding(source.binding().convert())
    }

    /// Property owning `binding` as its expression.
    #[must_use]
    pub fn from_binding(binding: Binding<T>) -> Self {
        let (eval, dependencies) = binding.into_parts();
        let this = Self::with_node(|id| PropertyData::expression(eval, Some(id)));
        this.notifier.depend_on_all(&dependencies);
        this
    }

    /// Move construction: the new property takes over `source`'s storage,
    /// its place in the notifier graph, and (if `source` owned its node)
    /// ownership. Callbacks registered on `source` are dropped with it.
    #[must_use]
    pub fn take<const W: bool>(mut source: BasicProperty<T, W>) -> Self {
        let id = PropertyId::next();
        let node = source.slot.current();
        if node.is_owned_by(source.id) {
            node.set_owner(Some(id));
        }
        let mut notifier = BindingNotifier::new();
        notifier.adopt(&mut source.notifier);
        Self {
            id,
            slot: source.detach_slot(),
            notifier,
        }
    }

    /// Current value; recomputed on every call.
    #[must_use]
    pub fn value(&self) -> T {
        self.slot.value()
    }

    /// Identity binding over this property, for composing expressions.
    #[must_use]
    pub fn binding(&self) -> Binding<T> {
        dispatch::unary_property::<Identity, T, WRITABLE>(self)
    }

    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// Whether this property owns the node it reads.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.slot.current().is_owned_by(self.id)
    }

    /// Representation of the node this property reads.
    #[must_use]
    pub fn repr_kind(&self) -> ReprKind {
        self.slot.current().kind()
    }

    /// Number of propagation passes that reached this property.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.notifier.version()
    }

    /// Registered callbacks, including expired ones not yet pruned.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    /// Outgoing notifier edges, including dead ones not yet pruned.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.notifier.dependent_count()
    }

    /// Replace the representation with `binding` and notify. Allowed on
    /// read-only properties: this is how they are re-seeded.
    pub fn bind(&mut self, binding: Binding<T>) {
        self.notifier.reset();
        self.absorb(binding);
        self.notifier.notify();
    }

    /// [`bind`](Self::bind), unless one of the binding's dependencies is
    /// downstream of this property.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::CircularDependency`] and leaves the property
    /// untouched when installing the binding would close a cycle.
    pub fn try_bind(&mut self, binding: Binding<T>) -> Result<()> {
        if binding.dependencies().iter().any(|dep| self.notifier.reaches(dep)) {
            return Err(self.cycle());
        }
        self.bind(binding);
        Ok(())
    }

    /// Call `f` after every change.
    pub fn on_changed(&self, mut f: impl FnMut() + 'static) {
        self.notifier.add_observer(move || {
            f();
            Flow::Continue
        });
    }

    /// Call `f` with the new value after every change.
    pub fn on_value_changed(&self, mut f: impl FnMut(T) + 'static) {
        self.on_value_changed_until(move |value| {
            f(value);
            Flow::Continue
        });
    }

    /// Call `f` with the new value after every change until it returns
    /// [`Flow::Done`].
    pub fn on_value_changed_until(&self, mut f: impl FnMut(T) -> Flow + 'static) {
        let slot = Rc::downgrade(&self.slot);
        self.notifier.add_observer(move || match slot.upgrade() {
            Some(slot) => f(slot.value()),
            None => Flow::Done,
        });
    }

    /// Call `f` after every change while `token` is alive.
    pub fn on_changed_while(&self, token: impl Liveness + 'static, mut f: impl FnMut() + 'static) {
        self.notifier.add_guarded_observer(token, move || {
            f();
            Flow::Continue
        });
    }

    /// Call `f` with the new value after every change while `token` is
    /// alive.
    pub fn on_value_changed_while(
        &self,
        token: impl Liveness + 'static,
        mut f: impl FnMut(T) + 'static,
    ) {
        let slot = Rc::downgrade(&self.slot);
        self.notifier
            .add_guarded_observer(token, move || match slot.upgrade() {
                Some(slot) => {
                    f(slot.value());
                    Flow::Continue
                }
                None => Flow::Done,
            });
    }

    /// Whether both properties read the very same storage node.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn shares_node_with<const W: bool>(&self, other: &BasicProperty<T, W>) -> bool {
        Rc::ptr_eq(&self.slot.current(), &other.slot.current())
    }

    pub(crate) fn slot(&self) -> &Rc<Slot<T>> {
        &self.slot
    }

    pub(crate) fn handle(&self) -> NotifierRef {
        self.notifier.handle()
    }

    /// Make sure this property owns the node it reads, so that copies made
    /// from it follow its own writes.
    fn unshare(&self) {
        let node = self.slot.current();
        if !node.is_owned_by(self.id) {
            self.slot.replace(PropertyData::alias(node, Some(self.id)));
            #[cfg(feature = "tracing")]
            tracing::trace!(message = "property.unshare", property = self.id.get());
        }
    }

    fn absorb(&self, binding: Binding<T>) {
        let (eval, dependencies) = binding.into_parts();
        let node = self.slot.current();
        if node.is_owned_by(self.id) {
            node.set_expression(eval);
        } else {
            self.slot
                .replace(PropertyData::expression(eval, Some(self.id)));
        }
        self.notifier.depend_on_all(&dependencies);
    }

    /// Point the slot at `node`. A node we owned until now that others
    /// still share is rewritten to read through our slot, unless `node`
    /// itself reads through it.
    fn install(&self, node: SharedData<T>) {
        let old = self.slot.replace(Rc::clone(&node));
        if !old.is_owned_by(self.id) || Rc::ptr_eq(&old, &node) {
            return;
        }
        old.set_owner(None);
        if Rc::strong_count(&old) > 1 && !node.reads_through(&old) {
            let slot = Rc::clone(&self.slot);
            old.set_expression(Rc::new(move || slot.value()));
        }
    }

    /// Hand the slot over to a new holder, leaving this property a private
    /// slot on the same node so that dropping it freezes nothing others read.
    fn detach_slot(&mut self) -> Rc<Slot<T>> {
        let node = self.slot.current();
        std::mem::replace(&mut self.slot, Slot::new(node))
    }

    fn cycle(&self) -> BindError {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "property.cycle_rejected",
            property = self.id.get()
        );
        BindError::CircularDependency { property: self.id }
    }
}

impl<T: Value> BasicProperty<T, true> {
    /// Write a literal and notify.
    ///
    /// The owner overwrites its node in place, so every copy sharing it sees
    /// the new value. A property that only shares someone else's node
    /// detaches from its sources and takes a fresh node instead.
    pub fn set_value(&mut self, value: T) {
        let node = self.slot.current();
        let in_place = node.is_owned_by(self.id);
        if !in_place || node.kind() != ReprKind::Literal {
            self.notifier.reset();
        }
        if in_place {
            node.set_literal(value);
        } else {
            self.slot
                .replace(PropertyData::literal(value, Some(self.id)));
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "property.set_value", property = self.id.get(), in_place);
        self.notifier.notify();
    }

    /// Write a literal of another value type, converted once.
    ///
    /// ```
    /// use rebind_core::Property;
    ///
    /// let mut flag: Property<bool> = Property::converted(0);
    /// flag.set_converted(4);
    /// assert!(flag.value());
    /// ```
    pub fn set_converted<U: Convert<T>>(&mut self, value: U) {
        self.set_value(value.convert());
    }

    /// Follow `source` from now on, like
    /// [`from_property`](BasicProperty::from_property), and notify.
    pub fn assign_property<const W: bool>(&mut self, source: &BasicProperty<T, W>) {
        self.notifier.reset();
        source.unshare();
        self.install(source.slot.current());
        self.notifier.depend_on(&source.handle());
        self.notifier.notify();
    }

    /// [`assign_property`](Self::assign_property), unless `source` is
    /// downstream of this property.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::CircularDependency`] and leaves the property
    /// untouched when following `source` would close a cycle.
    pub fn try_assign_property<const W: bool>(
        &mut self,
        source: &BasicProperty<T, W>,
    ) -> Result<()> {
        if self.notifier.reaches(&source.handle()) {
            return Err(self.cycle());
        }
        self.assign_property(source);
        Ok(())
    }

    /// Follow `source` across a value-type boundary and notify.
    pub fn assign_converted<U, const W: bool>(&mut self, source: &BasicProperty<U, W>)
    where
        U: Value + Convert<T>,
    {
        self.bind(source.binding().convert());
    }

    /// Move assignment: take over `source`'s storage and graph position, then
    /// notify. Edges that targeted this property expire.
    pub fn assign_taken<const W: bool>(&mut self, mut source: BasicProperty<T, W>) {
        // Expressions that captured `source` keep reading the moved node.
        source.detach_slot();
        let node = source.slot.current();
        let transfer = node.is_owned_by(source.id);
        self.install(Rc::clone(&node));
        if transfer {
            node.set_owner(Some(self.id));
        }
        self.notifier.adopt(&mut source.notifier);
        self.notifier.notify();
    }
}

impl<const WRITABLE: bool> BasicProperty<String, WRITABLE> {
    /// String property from anything string-like.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(value.into())
    }
}

impl<T: Value + Default, const WRITABLE: bool> Default for BasicProperty<T, WRITABLE> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Value, const WRITABLE: bool> From<T> for BasicProperty<T, WRITABLE> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<const WRITABLE: bool> From<&str> for BasicProperty<String, WRITABLE> {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl<T: Value> From<Binding<T>> for BasicProperty<T, false> {
    fn from(binding: Binding<T>) -> Self {
        Self::from_binding(binding)
    }
}

impl<T: Value, const WRITABLE: bool> Drop for BasicProperty<T, WRITABLE> {
    fn drop(&mut self) {
        let node = self.slot.current();
        if node.is_owned_by(self.id) {
            node.freeze();
            node.set_owner(None);
        } else if Rc::strong_count(&self.slot) > 1 {
            self.slot.replace(PropertyData::literal(node.value(), None));
        } else {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "property.freeze", property = self.id.get());
    }
}

impl<T: Value, const WRITABLE: bool> fmt::Debug for BasicProperty<T, WRITABLE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(if WRITABLE { "Property" } else { "ReadOnly" })
            .field("id", &self.id)
            .field("repr", &self.repr_kind())
            .field("owner", &self.is_owner())
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::BindingContext;
    use std::cell::Cell;

    fn probe<T: Value>(p: &BasicProperty<T, true>) -> Rc<RefCell<Vec<T>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        p.on_value_changed(move |v| sink.borrow_mut().push(v));
        seen
    }

    #[test]
    fn new_owns_literal() {
        let p = Property::new(3);
        assert_eq!(p.value(), 3);
        assert!(p.is_owner());
        assert_eq!(p.repr_kind(), ReprKind::Literal);
    }

    #[test]
    fn ids_are_unique() {
        let a = Property::new(0);
        let b = Property::new(0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn default_and_text_constructors() {
        let n: Property<i32> = Property::default();
        assert_eq!(n.value(), 0);
        let s = Property::text("hello");
        assert_eq!(s.value(), "hello");
        let t: ReadOnly<String> = "world".into();
        assert_eq!(t.value(), "world");
    }

    #[test]
    fn converted_literal_uses_truthiness() {
        let d: Property<bool> = Property::converted(0);
        assert!(!d.value());
        let e: Property<bool> = Property::converted(7u8);
        assert!(e.value());
    }

    #[test]
    fn set_converted_writes_through_conversion() {
        let mut d: Property<bool> = Property::converted(0);
        let seen = probe(&d);
        d.set_converted(4);
        assert!(d.value());
        d.set_converted(0u8);
        assert!(!d.value());
        assert_eq!(*seen.borrow(), vec![true, false]);

        let mut n: Property<i64> = Property::new(0);
        n.set_converted(true);
        assert_eq!(n.value(), 1);
    }

    #[test]
    fn set_value_notifies_with_new_value() {
        let mut a = Property::new(1);
        let seen = probe(&a);
        a.set_value(5);
        assert_eq!(a.value(), 5);
        assert_eq!(*seen.borrow(), vec![5]);
        assert_eq!(a.version(), 1);
    }

    #[test]
    fn copy_follows_source() {
        let mut a = Property::new(1);
        let b = Property::from_property(&a);
        assert!(b.shares_node_with(&a));
        assert!(!b.is_owner());
        let seen = probe(&a);
        let b_hits = Rc::new(Cell::new(0));
        let hits = Rc::clone(&b_hits);
        b.on_changed(move || hits.set(hits.get() + 1));

        a.set_value(3);
        assert_eq!(b.value(), 3);
        assert_eq!(*seen.borrow(), vec![3]);
        assert_eq!(b_hits.get(), 1);
    }

    #[test]
    fn writing_copy_detaches_it() {
        let mut a = Property::new(1);
        let mut b = Property::from_property(&a);
        b.set_value(5);
        assert_eq!(a.value(), 1);
        assert!(b.is_owner());

        a.set_value(7);
        assert_eq!(b.value(), 5);
        assert_eq!(b.version(), 1);
    }

    #[test]
    fn copy_of_copy_unshares_middle() {
        let mut a = Property::new(1);
        let mut b = Property::from_property(&a);
        let c = Property::from_property(&b);
        // b took a node of its own that reads through a's.
        assert!(b.is_owner());
        assert_eq!(b.repr_kind(), ReprKind::Alias);
        assert!(c.shares_node_with(&b));

        a.set_value(2);
        assert_eq!(c.value(), 2);

        b.set_value(9);
        assert_eq!(c.value(), 9);
        assert_eq!(a.value(), 2);
    }

    #[test]
    fn owner_write_after_unshare_drops_old_edge() {
        let mut a = Property::new(1);
        let mut b = Property::from_property(&a);
        let _c = Property::from_property(&b);
        b.set_value(4);
        let before = b.version();
        a.set_value(5);
        assert_eq!(b.version(), before);
        assert_eq!(b.value(), 4);
    }

    #[test]
    fn from_binding_tracks_dependencies() {
        let mut a = Property::new(2);
        let b = Property::new(3);
        let sum = Property::from_binding(&a + &b);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sum.on_value_changed(move |v| sink.borrow_mut().push(v));

        a.set_value(10);
        assert_eq!(sum.value(), 13);
        assert_eq!(*seen.borrow(), vec![13]);
        assert_eq!(sum.repr_kind(), ReprKind::Expression);
    }

    #[test]
    fn bind_replaces_edges() {
        let mut a = Property::new(1);
        let mut b = Property::new(10);
        let mut d = Property::new(0);
        d.bind(&a + 1);
        assert_eq!(d.value(), 2);

        d.bind(&b * 2);
        let before = d.version();
        a.set_value(100);
        assert_eq!(d.version(), before);
        b.set_value(4);
        assert_eq!(d.value(), 8);
    }

    #[test]
    fn set_value_after_bind_drops_edges() {
        let mut a = Property::new(1);
        let mut d = Property::from_binding(&a + 1);
        d.set_value(50);
        let before = d.version();
        a.set_value(2);
        assert_eq!(d.value(), 50);
        assert_eq!(d.version(), before);
    }

    #[test]
    fn readonly_reseeded_through_binding() {
        let mut a = Property::new(3);
        let mut r: ReadOnly<i32> = ReadOnly::from_property(&a);
        assert_eq!(r.value(), 3);
        r.bind(&a * 10);
        a.set_value(4);
        assert_eq!(r.value(), 40);
    }

    #[test]
    fn readonly_from_binding_conversion() {
        let a = Property::new(3);
        let r: ReadOnly<i32> = (&a + 1).into();
        assert_eq!(r.value(), 4);
    }

    #[test]
    fn readonly_source_of_writable_copies() {
        let a: ReadOnly<i32> = ReadOnly::new(3);
        let mut b = Property::from_property(&a);
        let c: Property<bool> = Property::from_converted(&a);
        assert_eq!(b.value(), 3);
        assert!(c.value());
        b.set_value(6);
        assert_eq!(b.value(), 6);
        assert_eq!(a.value(), 3);
    }

    #[test]
    fn converted_copy_propagates() {
        let mut n = Property::new(0);
        let flag: Property<bool> = Property::from_converted(&n);
        assert!(!flag.value());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        flag.on_value_changed(move |v| sink.borrow_mut().push(v));

        n.set_value(4);
        assert!(flag.value());
        assert_eq!(*seen.borrow(), vec![true]);
        assert!(flag.is_owner());
    }

    #[test]
    fn assign_property_switches_source() {
        let mut a = Property::new(1);
        let mut b = Property::new(2);
        let mut c = Property::new(0);
        c.assign_property(&a);
        assert_eq!(c.value(), 1);
        c.assign_property(&b);
        assert_eq!(c.value(), 2);

        let before = c.version();
        a.set_value(11);
        assert_eq!(c.version(), before);
        b.set_value(22);
        assert_eq!(c.value(), 22);
    }

    #[test]
    fn abandoned_node_is_forwarded_to_sharers() {
        let mut x = Property::new(7);
        let mut a = Property::new(1);
        let b = Property::from_property(&a);
        a.assign_property(&x);
        assert_eq!(b.value(), 7);
        x.set_value(8);
        assert_eq!(b.value(), 8);
    }

    #[test]
    fn forwarded_node_follows_every_reassignment() {
        let x = Property::new(1);
        let mut y = Property::new(2);
        let mut a = Property::new(0);
        let b = Property::from_property(&a);
        a.assign_property(&x);
        assert_eq!(b.value(), 1);
        a.assign_property(&y);
        assert_eq!(b.value(), 2);
        y.set_value(3);
        assert_eq!(b.value(), 3);
    }

    #[test]
    fn dropped_copy_freezes_for_its_readers() {
        let mut a = Property::new(1);
        let b = Property::from_property(&a);
        let c = Property::from_binding(&b + 0);
        drop(b);
        a.set_value(5);
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn assigning_from_own_copy_keeps_value() {
        let mut a = Property::new(5);
        let b = Property::from_property(&a);
        a.assign_property(&b);
        assert_eq!(a.value(), 5);
        assert_eq!(b.value(), 5);
    }

    #[test]
    fn assign_converted_follows_source() {
        let mut n = Property::new(2u8);
        let mut wide: Property<u32> = Property::new(0);
        wide.assign_converted(&n);
        assert_eq!(wide.value(), 2);
        n.set_value(200);
        assert_eq!(wide.value(), 200);
    }

    #[test]
    fn take_keeps_dependents_and_sources() {
        let mut src = Property::new(1);
        let old = Property::from_binding(&src + 1);
        let sink = Property::from_property(&old);
        let moved = Property::take(old);
        assert!(moved.is_owner());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let probe_sink = Rc::clone(&seen);
        sink.on_value_changed(move |v| probe_sink.borrow_mut().push(v));

        src.set_value(5);
        assert_eq!(moved.value(), 6);
        assert_eq!(sink.value(), 6);
        assert_eq!(*seen.borrow(), vec![6]);
    }

    #[test]
    fn take_does_not_steal_foreign_ownership() {
        let mut a = Property::new(1);
        let b = Property::from_property(&a);
        let moved = Property::take(b);
        assert!(a.is_owner());
        assert!(!moved.is_owner());
        a.set_value(4);
        assert_eq!(moved.value(), 4);
    }

    #[test]
    fn assign_taken_adopts_storage() {
        let mut src = Property::new(1);
        let mut target = Property::new(0);
        let follower = Property::from_property(&target);
        target.assign_taken(Property::from_binding(&src * 3));
        assert_eq!(target.value(), 3);
        assert!(target.is_owner());
        src.set_value(2);
        assert_eq!(target.value(), 6);
        assert_eq!(follower.value(), 6);
    }

    #[test]
    fn drop_freezes_owned_expression() {
        let mut a = Property::new(2);
        let b = Property::from_binding(&a * 2);
        let c = Property::from_property(&b);
        drop(b);
        assert_eq!(c.value(), 4);
        a.set_value(10);
        assert_eq!(c.value(), 4);
    }

    #[test]
    fn reading_dropped_operand_yields_last_value() {
        let mut a = Property::new(1);
        let sum = Property::from_binding(&a + 1);
        a.set_value(9);
        drop(a);
        assert_eq!(sum.value(), 10);
    }

    #[test]
    fn on_value_changed_until_stops() {
        let mut a = Property::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        a.on_value_changed_until(move |v| {
            sink.borrow_mut().push(v);
            if v >= 2 { Flow::Done } else { Flow::Continue }
        });
        for v in 1..=4 {
            a.set_value(v);
        }
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(a.observer_count(), 0);
    }

    #[test]
    fn guarded_callbacks_expire_with_context() {
        let mut a = Property::new(0);
        let mut ctx = BindingContext::new();
        let hits = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        a.on_changed_while(ctx.token(), move || h.set(h.get() + 1));
        let l = Rc::clone(&last);
        a.on_value_changed_while(ctx.token(), move |v| l.set(v));

        a.set_value(1);
        ctx.reset();
        a.set_value(2);
        assert_eq!(hits.get(), 1);
        assert_eq!(last.get(), 1);
        assert_eq!(a.observer_count(), 0);
    }

    #[test]
    fn try_bind_rejects_cycle() {
        let mut a = Property::new(1);
        let b = Property::from_binding(&a + 1);
        let err = a.try_bind(&b * 2).unwrap_err();
        assert_eq!(err, BindError::CircularDependency { property: a.id() });
        assert_eq!(a.value(), 1);
        assert!(a.try_bind(Binding::constant(3)).is_ok());
        assert_eq!(b.value(), 4);
    }

    #[test]
    fn try_bind_rejects_self_dependency() {
        let mut a = Property::new(1);
        assert!(a.try_bind(&a + 1).is_err());
    }

    #[test]
    fn try_assign_property_rejects_cycle() {
        let mut a = Property::new(1);
        let b = Property::from_property(&a);
        let c = Property::from_property(&b);
        assert!(a.try_assign_property(&c).is_err());
        let mut d = Property::new(0);
        assert!(d.try_assign_property(&c).is_ok());
        a.set_value(3);
        assert_eq!(d.value(), 3);
    }

    #[test]
    fn debug_mentions_kind() {
        let a = Property::new(1);
        let dbg = format!("{a:?}");
        assert!(dbg.starts_with("Property"));
        assert!(dbg.contains("Literal"));
        let r: ReadOnly<i32> = ReadOnly::new(1);
        assert!(format!("{r:?}").starts_with("ReadOnly"));
    }

    #[test]
    fn property_id_display() {
        assert_eq!(PropertyId::from_raw(9).to_string(), "property#9");
        assert_eq!(PropertyId::from_raw(9).get(), 9);
    }
}
