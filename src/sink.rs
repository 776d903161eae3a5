use std::{
    cell::{Cell, RefCell},
    fmt,
    mem::take,
    rc::{Rc, Weak},
};

use crate::{
    core::{BindSink, NodeId, NodeKind, SourceBindings, Task},
    Failure, Upstreams,
};


/// Alias of [`Sink`].
pub type Slot = Sink;

/// Call a function each time upstream signals change.
///
/// The function is not called on creation.
/// When an upstream signal notifies a change, a flush is scheduled on the task queue of the current thread,
/// and the function is called when [`Runtime::run_tasks`](crate::Runtime::run_tasks) performs that flush.
/// Any number of notifications before the flush result in a single flush,
/// and the function is called only if at least one upstream value has actually changed since the previous flush.
///
/// If the `Sink` is dropped or [destroyed](Self::destroy), the function will not be called again.
#[must_use]
pub struct Sink(Rc<dyn DynSink>);

impl Sink {
    pub fn new<U: Upstreams>(upstreams: U, mut f: impl FnMut(&U) + 'static) -> Self {
        Self::try_new(upstreams, move |u| {
            f(u);
            Ok(())
        })
    }

    /// Create a `Sink` with a fallible callback.
    ///
    /// An error returned by `f` is logged and otherwise ignored.
    pub fn try_new<U: Upstreams>(
        upstreams: U,
        f: impl FnMut(&U) -> Result<(), Failure> + 'static,
    ) -> Self {
        Self(SinkNode::new(upstreams, f))
    }

    /// Schedule a flush without an upstream change.
    ///
    /// As with a notification, the function is called only if an upstream value differs from the last observed one.
    pub fn update(&self) {
        self.0.clone().schedule();
    }

    /// Unlinks this sink from the upstream signals and releases the callback.
    ///
    /// Calling this method more than once has no effect.
    pub fn destroy(&self) {
        self.0.destroy();
    }
    pub fn is_destroyed(&self) -> bool {
        self.0.is_destroyed()
    }
    pub fn id(&self) -> NodeId {
        self.0.id()
    }
}
impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("id", &self.id())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

trait DynSink: 'static {
    fn id(&self) -> NodeId;
    fn schedule(self: Rc<Self>);
    fn destroy(&self);
    fn is_destroyed(&self) -> bool;
}

type Callback<U> = Box<dyn FnMut(&U) -> Result<(), Failure>>;

struct SinkNode<U> {
    id: NodeId,
    sources: RefCell<SourceBindings>,
    upstreams: RefCell<Option<Rc<U>>>,
    callback: RefCell<Option<Callback<U>>>,
    scheduled: Cell<bool>,
    destroyed: Cell<bool>,
}

impl<U: Upstreams> SinkNode<U> {
    fn new(upstreams: U, f: impl FnMut(&U) -> Result<(), Failure> + 'static) -> Rc<Self> {
        let id = NodeId::new();
        let mut sources = SourceBindings::from_upstreams(&upstreams);
        tracing::trace!(%id, "sink created");
        Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn BindSink> = this.clone();
            sources.link(id, &sink);
            Self {
                id,
                sources: RefCell::new(sources),
                upstreams: RefCell::new(Some(Rc::new(upstreams))),
                callback: RefCell::new(Some(Box::new(f))),
                scheduled: Cell::new(false),
                destroyed: Cell::new(false),
            }
        })
    }

    fn schedule_flush(self: &Rc<Self>) {
        if self.destroyed.get() || self.scheduled.replace(true) {
            return;
        }
        tracing::trace!(id = %self.id, "sink scheduled");
        Task::from_weak_fn(Rc::downgrade(self), Self::flush).schedule()
    }

    fn flush(self: Rc<Self>) {
        self.scheduled.set(false);
        if SourceBindings::refresh(&self.sources) {
            self.execute();
        }
    }

    fn execute(&self) {
        let Some(upstreams) = self.upstreams.borrow().clone() else {
            return;
        };
        let mut callback = RestoreCallback {
            node: self,
            callback: self.callback.borrow_mut().take(),
        };
        let Some(f) = &mut callback.callback else {
            return;
        };
        let result = f(&upstreams);
        drop(callback);
        if let Err(e) = result {
            tracing::error!(id = %self.id, error = %e, "sink callback failed");
        }
    }
}

/// Puts the callback back into the node when the call ends, including by panic,
/// unless the node has been destroyed during the call.
struct RestoreCallback<'a, U> {
    node: &'a SinkNode<U>,
    callback: Option<Callback<U>>,
}
impl<U> Drop for RestoreCallback<'_, U> {
    fn drop(&mut self) {
        if !self.node.destroyed.get() {
            *self.node.callback.borrow_mut() = self.callback.take();
        }
    }
}

impl<U: Upstreams> DynSink for SinkNode<U> {
    fn id(&self) -> NodeId {
        self.id
    }
    fn schedule(self: Rc<Self>) {
        self.schedule_flush()
    }
    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        tracing::trace!(id = %self.id, "sink destroyed");
        take(&mut *self.sources.borrow_mut()).unlink_all(self.id);
        let callback = self.callback.borrow_mut().take();
        let upstreams = self.upstreams.borrow_mut().take();
        drop(callback);
        drop(upstreams);
    }
    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl<U: Upstreams> BindSink for SinkNode<U> {
    fn id(&self) -> NodeId {
        self.id
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }
    fn notify(self: Rc<Self>) {
        self.schedule_flush()
    }
}

impl<U> Drop for SinkNode<U> {
    fn drop(&mut self) {
        take(self.sources.get_mut()).unlink_all(self.id);
    }
}
