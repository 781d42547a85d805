#![forbid(unsafe_code)]

//! Change-propagation graph.
//!
//! # Design
//!
//! Every property owns one [`BindingNotifier`]. A notifier is split into two
//! shared pieces:
//!
//! - the **core**: direct callbacks, edges to dependent notifiers, and a
//!   version counter;
//! - the **identity** token: the thing other notifiers hold an edge to.
//!
//! Edges are stored as `Weak<Identity>` on the *source* notifier and point at
//! the *dependent*. Only the owning notifier holds the identity strongly, so
//! dropping a property silently expires every edge that targeted it; the
//! dead edge is pruned the next time its source notifies. Replacing the
//! identity ([`BindingNotifier::reset`]) detaches all incoming edges at once
//! while keeping the callbacks and outgoing edges.
//!
//! # Invariants
//!
//! 1. Callbacks run before dependents, in registration order.
//! 2. A pass first collects every reachable notifier, then fires them in
//!    topological order: a notifier fires only after all of its reachable
//!    sources. Notifiers in a cycle fire in discovery order.
//! 3. Within one propagation pass each notifier fires at most once, so
//!    diamonds and duplicate edges never double-notify and notifier cycles
//!    terminate.
//! 4. Dependents attached by a callback during a pass are scheduled in the
//!    same pass; dependents dropped during a pass are skipped.
//! 5. No internal borrow is held while user callbacks run: a callback may
//!    register new callbacks or read any property.
//!
//! # Failure Modes
//!
//! - **Re-entrant fire**: a callback that (indirectly) triggers a pass which
//!   reaches the same callback again is skipped for that nested pass instead
//!   of recursing.
//! - **Stale edges**: edges to dropped dependents remain in the source until
//!   its next `notify()`; `dependent_count()` includes them until then.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashSet;

/// Sentinel returned by callbacks that can unregister themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep the callback registered.
    #[default]
    Continue,
    /// Remove the callback after this invocation.
    Done,
}

/// Something whose referent may go away; guarded callbacks stop firing once
/// their token reports dead.
pub trait Liveness {
    /// Whether the guarded referent is still alive.
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized> Liveness for Weak<T> {
    #[inline]
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Owner of a liveness anchor for "observe while alive" registrations.
///
/// Keep a `BindingContext` next to the state a callback touches and register
/// with [`token()`](Self::token). Dropping the context, or calling
/// [`reset()`](Self::reset), expires every token issued so far; their
/// callbacks are skipped and pruned at the next notification.
///
/// ```
/// use rebind_core::{BindingContext, Property};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut width = Property::new(10);
/// let seen = Rc::new(Cell::new(0));
/// let ctx = BindingContext::new();
/// let probe = Rc::clone(&seen);
/// width.on_value_changed_while(ctx.token(), move |w| probe.set(w));
///
/// width.set_value(20);
/// assert_eq!(seen.get(), 20);
///
/// drop(ctx);
/// width.set_value(30);
/// assert_eq!(seen.get(), 20);
/// ```
#[derive(Debug, Default)]
pub struct BindingContext {
    anchor: Rc<()>,
}

impl BindingContext {
    /// Create a live context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token tied to the current anchor.
    #[must_use]
    pub fn token(&self) -> ContextToken {
        ContextToken(Rc::downgrade(&self.anchor))
    }

    /// Expire all previously issued tokens; new tokens are live again.
    pub fn reset(&mut self) {
        self.anchor = Rc::new(());
    }
}

/// Liveness token issued by a [`BindingContext`].
#[derive(Debug, Clone)]
pub struct ContextToken(Weak<()>);

impl Liveness for ContextToken {
    #[inline]
    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

struct Observer {
    guard: Option<Box<dyn Liveness>>,
    callback: RefCell<Box<dyn FnMut() -> Flow>>,
}

impl Observer {
    fn fire(&self) -> Flow {
        if self.guard.as_ref().is_some_and(|guard| !guard.is_alive()) {
            return Flow::Done;
        }
        match self.callback.try_borrow_mut() {
            Ok(mut callback) => callback(),
            Err(_) => Flow::Continue,
        }
    }
}

#[derive(Default)]
struct NotifierCore {
    observers: RefCell<Vec<Rc<Observer>>>,
    dependents: RefCell<Vec<Weak<Identity>>>,
    version: Cell<u64>,
}

/// Edge target. Points at the core that should be notified; the pointer is
/// redirected when a notifier adopts another notifier's incoming edges.
struct Identity {
    core: RefCell<Rc<NotifierCore>>,
}

impl Identity {
    fn new(core: &Rc<NotifierCore>) -> Rc<Self> {
        Rc::new(Self {
            core: RefCell::new(Rc::clone(core)),
        })
    }

    fn core(&self) -> Rc<NotifierCore> {
        Rc::clone(&self.core.borrow())
    }
}

/// Weak handle to a notifier, as recorded in a binding's dependency set.
#[derive(Clone)]
pub(crate) struct NotifierRef(Weak<Identity>);

impl NotifierRef {
    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub(crate) fn same(&self, other: &NotifierRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }

    fn core(&self) -> Option<Rc<NotifierCore>> {
        self.0.upgrade().map(|identity| identity.core())
    }
}

impl fmt::Debug for NotifierRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NotifierRef").field(&self.is_live()).finish()
    }
}

/// Per-property node of the change-propagation graph.
pub struct BindingNotifier {
    core: Rc<NotifierCore>,
    identity: Rc<Identity>,
}

impl Default for BindingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingNotifier {
    /// Create an active notifier with no callbacks and no edges.
    #[must_use]
    pub fn new() -> Self {
        let core = Rc::new(NotifierCore::default());
        let identity = Identity::new(&core);
        Self { core, identity }
    }

    pub(crate) fn handle(&self) -> NotifierRef {
        NotifierRef(Rc::downgrade(&self.identity))
    }

    /// Detach from every source: all edges that currently target this
    /// notifier expire. Callbacks and outgoing edges are kept, and new
    /// incoming edges may be attached right away.
    pub fn reset(&mut self) {
        self.identity = Identity::new(&self.core);
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "notifier.reset");
    }

    /// Register an edge `source -> self`, so `source.notify()` reaches this
    /// notifier. Dead sources and duplicate edges are ignored.
    pub(crate) fn depend_on(&self, source: &NotifierRef) {
        let Some(core) = source.core() else {
            return;
        };
        let mut dependents = core.dependents.borrow_mut();
        let me = Rc::downgrade(&self.identity);
        if !dependents.iter().any(|edge| Weak::ptr_eq(edge, &me)) {
            dependents.push(me);
        }
    }

    pub(crate) fn depend_on_all<'a>(&self, sources: impl IntoIterator<Item = &'a NotifierRef>) {
        for source in sources {
            self.depend_on(source);
        }
    }

    /// Take over `other`'s place in the graph: edges that targeted `other`
    /// now reach this notifier, and `other`'s dependents become dependents of
    /// this notifier. Our previous incoming edges expire, as with
    /// [`reset`](Self::reset). `other` keeps its callbacks and is left
    /// detached.
    pub(crate) fn adopt(&mut self, other: &mut BindingNotifier) {
        let stolen = std::mem::replace(&mut other.identity, Identity::new(&other.core));
        *stolen.core.borrow_mut() = Rc::clone(&self.core);
        self.identity = stolen;

        let moved: Vec<_> = other.core.dependents.borrow_mut().drain(..).collect();
        let mut dependents = self.core.dependents.borrow_mut();
        for edge in moved {
            if !dependents.iter().any(|own| Weak::ptr_eq(own, &edge)) {
                dependents.push(edge);
            }
        }
    }

    /// Register an unconditional callback.
    pub fn add_observer(&self, callback: impl FnMut() -> Flow + 'static) {
        self.push_observer(None, Box::new(callback));
    }

    /// Register a callback that is skipped and pruned once `guard` dies.
    pub fn add_guarded_observer(
        &self,
        guard: impl Liveness + 'static,
        callback: impl FnMut() -> Flow + 'static,
    ) {
        self.push_observer(Some(Box::new(guard)), Box::new(callback));
    }

    fn push_observer(&self, guard: Option<Box<dyn Liveness>>, callback: Box<dyn FnMut() -> Flow>) {
        self.core.observers.borrow_mut().push(Rc::new(Observer {
            guard,
            callback: RefCell::new(callback),
        }));
    }

    /// Run one propagation pass starting at this notifier.
    pub fn notify(&self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "property.notify",
            observers = self.observer_count(),
            dependents = self.dependent_count()
        )
        .entered();
        let root = Visit {
            edge: Rc::downgrade(&self.identity),
            core: Rc::clone(&self.core),
        };
        let mut seen = AHashSet::new();
        let mut plan = Vec::new();
        post_order(root, &mut seen, &mut plan);
        plan.reverse();

        let mut i = 0;
        while i < plan.len() {
            let visit = &plan[i];
            if i == 0 || visit.edge.strong_count() > 0 {
                let core = Rc::clone(&visit.core);
                core.fire();
                // Dependents attached by the callbacks just run.
                let mut late = Vec::new();
                for child in core.live_dependents() {
                    post_order(child, &mut seen, &mut late);
                }
                if !late.is_empty() {
                    late.reverse();
                    plan.splice(i + 1..i + 1, late);
                }
            }
            i += 1;
        }
    }

    /// Number of registered callbacks (including expired ones not yet pruned).
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.core.observers.borrow().len()
    }

    /// Number of outgoing edges (including dead ones not yet pruned).
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.core.dependents.borrow().len()
    }

    /// Number of propagation passes that reached this notifier.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.version.get()
    }

    /// Whether `target` is reachable from this notifier through outgoing
    /// edges (or is this notifier).
    pub(crate) fn reaches(&self, target: &NotifierRef) -> bool {
        let Some(target) = target.core() else {
            return false;
        };
        let mut visited = AHashSet::new();
        let mut stack = vec![Rc::clone(&self.core)];
        while let Some(core) = stack.pop() {
            if Rc::ptr_eq(&core, &target) {
                return true;
            }
            if !visited.insert(Rc::as_ptr(&core) as usize) {
                continue;
            }
            for edge in core.dependents.borrow().iter() {
                if let Some(identity) = edge.upgrade() {
                    stack.push(identity.core());
                }
            }
        }
        false
    }
}

impl NotifierCore {
    fn live_dependents(&self) -> Vec<Visit> {
        self.dependents
            .borrow()
            .iter()
            .filter_map(|edge| {
                let identity = edge.upgrade()?;
                Some(Visit {
                    edge: Weak::clone(edge),
                    core: identity.core(),
                })
            })
            .collect()
    }

    /// Run the callbacks of one pass, then drop dead edges.
    fn fire(&self) {
        self.version.set(self.version.get() + 1);

        // Snapshot first: callbacks run without any borrow held.
        let observers: Vec<Rc<Observer>> = self.observers.borrow().clone();
        let finished: Vec<Rc<Observer>> = observers
            .into_iter()
            .filter(|observer| observer.fire() == Flow::Done)
            .collect();
        if !finished.is_empty() {
            self.observers
                .borrow_mut()
                .retain(|observer| !finished.iter().any(|done| Rc::ptr_eq(observer, done)));
        }

        let dead = {
            let mut dependents = self.dependents.borrow_mut();
            let before = dependents.len();
            dependents.retain(|edge| edge.strong_count() > 0);
            before - dependents.len()
        };

        #[cfg(feature = "tracing")]
        if dead > 0 || !finished.is_empty() {
            tracing::trace!(
                message = "notifier.prune",
                pruned_edges = dead,
                pruned_observers = finished.len()
            );
        }
        #[cfg(not(feature = "tracing"))]
        let _ = dead;
    }
}

/// One scheduled notification. The core is held strongly for the whole
/// pass so its address stays unique among the visited keys; the edge tells
/// whether the dependent is still attached when its turn comes.
#[derive(Clone)]
struct Visit {
    edge: Weak<Identity>,
    core: Rc<NotifierCore>,
}

impl Visit {
    fn key(&self) -> usize {
        Rc::as_ptr(&self.core) as usize
    }
}

struct Frame {
    visit: Visit,
    children: Vec<Visit>,
    next: usize,
}

impl Frame {
    fn new(visit: Visit) -> Self {
        let children = visit.core.live_dependents();
        Self {
            visit,
            children,
            next: 0,
        }
    }
}

/// Append every notifier reachable from `root` and not yet in `seen` to
/// `order`, in post-order.
fn post_order(root: Visit, seen: &mut AHashSet<usize>, order: &mut Vec<Visit>) {
    if !seen.insert(root.key()) {
        return;
    }
    let mut stack = vec![Frame::new(root)];
    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.children.get(frame.next).cloned() else {
            if let Some(done) = stack.pop() {
                order.push(done.visit);
            }
            continue;
        };
        frame.next += 1;
        if seen.insert(child.key()) {
            stack.push(Frame::new(child));
        }
    }
}

impl fmt::Debug for BindingNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingNotifier")
            .field("observers", &self.observer_count())
            .field("dependents", &self.dependent_count())
            .field("version", &self.version())
            .finish()
    }
}
