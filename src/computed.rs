use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use parse_display::Display;

use crate::{
    core::{BindKey, BindSink, BindSource, NodeId, NodeKind, SinkBindings, Snapshot, SourceBindings},
    signal::sealed::Sealed,
    Failure, SameValue, Signal, Sinks, Upstreams,
};


/// State of the memoization of a [`Computed`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display)]
#[display(style = "snake_case")]
pub enum Phase {
    /// The memoized result is up to date.
    Fresh,
    /// An upstream signal has notified a change. The upstream values are checked on the next read.
    Dirty,
    /// The derivation function is running.
    /// Reads from the derivation function itself return the previous result.
    Computing,
}

/// A lazily evaluated, memoized value derived from other signals.
///
/// The derivation function is evaluated once on creation, and after that only when the value is read
/// after one of the upstream signals has actually changed.
///
/// Changes of upstream signals are propagated immediately, but only as a dirty mark.
/// Clones refer to the same node.
#[derive_ex(Clone, bound())]
pub struct Computed<T: 'static>(Rc<dyn DynComputed<T>>);

impl<T: Clone + SameValue + 'static> Computed<T> {
    /// Create a new `Computed` from an infallible derivation function.
    ///
    /// `f` receives `upstreams` as passed to this function.
    pub fn new<U: Upstreams>(upstreams: U, f: impl Fn(&U) -> T + 'static) -> Self {
        Self::try_new(upstreams, move |u| Ok(f(u)))
    }

    /// Create a new `Computed` from a fallible derivation function.
    ///
    /// An error returned by `f` is memoized just like a value, and returned from [`get`](Self::get)
    /// until the derivation function is evaluated again.
    pub fn try_new<U: Upstreams>(
        upstreams: U,
        f: impl Fn(&U) -> Result<T, Failure> + 'static,
    ) -> Self {
        Self(ComputedNode::new(upstreams, f))
    }

    /// Returns the memoized result, evaluating the derivation function first if an upstream value has changed.
    pub fn get(&self) -> Result<T, Failure> {
        self.0.get()
    }
}
impl<T: 'static> Computed<T> {
    pub fn phase(&self) -> Phase {
        self.0.phase()
    }
    pub fn id(&self) -> NodeId {
        self.0.id()
    }

    /// Returns the dependents of this node.
    pub fn sinks(&self) -> Sinks {
        self.0.sinks()
    }

    /// Create a handle that does not keep the node alive.
    ///
    /// Useful for a derivation function that reads its own node.
    pub fn downgrade(&self) -> WeakComputed<T> {
        WeakComputed(Rc::downgrade(&self.0))
    }
}
impl<T: 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("phase", &self.phase())
            .finish()
    }
}

impl<T: Clone + SameValue + 'static> Sealed for Computed<T> {
    fn to_source(&self) -> Rc<dyn BindSource> {
        self.0.clone().to_source()
    }
}
impl<T: Clone + SameValue + 'static> Signal for Computed<T> {
    type Value = Result<T, Failure>;

    fn get(&self) -> Self::Value {
        self.get()
    }
    fn id(&self) -> NodeId {
        self.id()
    }
    fn sinks(&self) -> Sinks {
        self.sinks()
    }
}

/// A weak handle to a [`Computed`], created by [`Computed::downgrade`].
#[derive_ex(Clone, bound())]
pub struct WeakComputed<T: 'static>(Weak<dyn DynComputed<T>>);

impl<T: 'static> WeakComputed<T> {
    pub fn upgrade(&self) -> Option<Computed<T>> {
        self.0.upgrade().map(Computed)
    }
}

trait DynComputed<T>: 'static {
    fn get(&self) -> Result<T, Failure>;
    fn phase(&self) -> Phase;
    fn id(&self) -> NodeId;
    fn sinks(&self) -> Sinks;
    fn to_source(self: Rc<Self>) -> Rc<dyn BindSource>;
}

struct ComputedNode<U, T: 'static> {
    id: NodeId,
    sinks: SinkBindings,
    sources: RefCell<SourceBindings>,
    upstreams: U,
    #[allow(clippy::type_complexity)]
    f: Box<dyn Fn(&U) -> Result<T, Failure>>,
    phase: Cell<Phase>,
    value: RefCell<Result<T, Failure>>,
}

impl<U, T> ComputedNode<U, T>
where
    U: Upstreams,
    T: Clone + SameValue + 'static,
{
    fn new(upstreams: U, f: impl Fn(&U) -> Result<T, Failure> + 'static) -> Rc<Self> {
        let id = NodeId::new();
        let mut sources = SourceBindings::from_upstreams(&upstreams);
        let value = f(&upstreams);
        tracing::trace!(%id, "computed created");
        Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn BindSink> = this.clone();
            sources.link(id, &sink);
            Self {
                id,
                sinks: SinkBindings::new(),
                sources: RefCell::new(sources),
                upstreams,
                f: Box::new(f),
                phase: Cell::new(Phase::Fresh),
                value: RefCell::new(value),
            }
        })
    }

    fn get(&self) -> Result<T, Failure> {
        match self.phase.get() {
            Phase::Dirty => self.update(),
            Phase::Fresh | Phase::Computing => self.value.borrow().clone(),
        }
    }

    fn update(&self) -> Result<T, Failure> {
        if SourceBindings::refresh(&self.sources) {
            self.compute();
        } else if self.phase.get() != Phase::Computing {
            self.phase.set(Phase::Fresh);
        }
        self.value.borrow().clone()
    }

    fn compute(&self) {
        if self.phase.get() == Phase::Computing {
            return;
        }
        tracing::trace!(id = %self.id, "compute");
        let _guard = ComputingGuard::new(&self.phase);
        let value = (self.f)(&self.upstreams);
        *self.value.borrow_mut() = value;
    }
}

struct ComputingGuard<'a>(&'a Cell<Phase>);

impl<'a> ComputingGuard<'a> {
    fn new(phase: &'a Cell<Phase>) -> Self {
        phase.set(Phase::Computing);
        Self(phase)
    }
}
impl Drop for ComputingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(Phase::Fresh);
    }
}

impl<U, T> DynComputed<T> for ComputedNode<U, T>
where
    U: Upstreams,
    T: Clone + SameValue + 'static,
{
    fn get(&self) -> Result<T, Failure> {
        self.get()
    }
    fn phase(&self) -> Phase {
        self.phase.get()
    }
    fn id(&self) -> NodeId {
        self.id
    }
    fn sinks(&self) -> Sinks {
        Sinks::new(&self.sinks)
    }
    fn to_source(self: Rc<Self>) -> Rc<dyn BindSource> {
        self
    }
}

impl<U, T> BindSource for ComputedNode<U, T>
where
    U: Upstreams,
    T: Clone + SameValue + 'static,
{
    fn id(&self) -> NodeId {
        self.id
    }
    fn pull(&self) -> Rc<dyn Snapshot> {
        Rc::new(self.get())
    }
    fn link(&self, id: NodeId, sink: Weak<dyn BindSink>) -> BindKey {
        self.sinks.link(id, sink)
    }
    fn unlink(&self, key: BindKey, id: NodeId) {
        self.sinks.unlink(key, id)
    }
}

impl<U, T> BindSink for ComputedNode<U, T>
where
    U: Upstreams,
    T: Clone + SameValue + 'static,
{
    fn id(&self) -> NodeId {
        self.id
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Computed
    }
    fn notify(self: Rc<Self>) {
        if self.phase.get() == Phase::Fresh {
            tracing::trace!(id = %self.id, "computed dirty");
            self.phase.set(Phase::Dirty);
            self.sinks.notify();
        }
    }
}
