use std::{
    any::Any,
    cell::RefCell,
    rc::{Rc, Weak},
};

use slabmap::SlabMap;

use crate::{SameValue, Upstreams};

use super::{NodeId, NodeKind};

/// A node that other nodes can depend on.
pub trait BindSource: 'static {
    fn id(&self) -> NodeId;

    /// Returns the current value, bringing it up to date first if necessary.
    fn pull(&self) -> Rc<dyn Snapshot>;

    fn link(&self, id: NodeId, sink: Weak<dyn BindSink>) -> BindKey;
    fn unlink(&self, key: BindKey, id: NodeId);
}

/// A node that can be notified of upstream changes.
pub trait BindSink: 'static {
    fn id(&self) -> NodeId;
    fn kind(&self) -> NodeKind;
    fn notify(self: Rc<Self>);
}

/// A value observed from a [`BindSource`], compared with same-value semantics.
pub trait Snapshot: 'static {
    fn same_as(&self, other: &dyn Snapshot) -> bool;
    fn as_any(&self) -> &dyn Any;
}
impl<T: SameValue + 'static> Snapshot for T {
    fn same_as(&self, other: &dyn Snapshot) -> bool {
        Snapshot::as_any(other)
            .downcast_ref::<T>()
            .is_some_and(|other| self.same_value(other))
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindKey(usize);

struct SinkBinding {
    id: NodeId,
    sink: Weak<dyn BindSink>,
}

/// Dependents of a node.
///
/// Only weak handles are stored. Entries whose node has been dropped are removed
/// the next time the dependents are iterated.
#[derive(Clone, Default)]
pub struct SinkBindings(Rc<RefCell<SlabMap<SinkBinding>>>);

impl SinkBindings {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn link(&self, id: NodeId, sink: Weak<dyn BindSink>) -> BindKey {
        BindKey(self.0.borrow_mut().insert(SinkBinding { id, sink }))
    }

    /// Removes the dependent registered with `key`.
    ///
    /// Does nothing if the entry has already been removed, or if `key` has since been reused by another node.
    pub fn unlink(&self, key: BindKey, id: NodeId) {
        let Ok(mut bindings) = self.0.try_borrow_mut() else {
            return;
        };
        if bindings.get(key.0).is_some_and(|b| b.id == id) {
            bindings.remove(key.0);
        }
    }

    /// Calls [`BindSink::notify`] of every live dependent.
    pub fn notify(&self) {
        for sink in self.live() {
            sink.notify();
        }
    }

    /// Returns the live dependents and removes the dead ones.
    pub fn live(&self) -> Vec<Rc<dyn BindSink>> {
        let mut bindings = self.0.borrow_mut();
        let mut live = Vec::with_capacity(bindings.len());
        let mut released = Vec::new();
        for (key, binding) in bindings.iter() {
            match binding.sink.upgrade() {
                Some(sink) => live.push(sink),
                None => released.push(key),
            }
        }
        for key in released {
            bindings.remove(key);
        }
        live
    }

    /// Number of registered dependents, including the ones not yet known to be dead.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn keys(&self) -> Vec<BindKey> {
        self.0.borrow().iter().map(|(key, _)| BindKey(key)).collect()
    }

    /// Returns the dependent registered with `key` if it is alive, and removes it if it is dead.
    pub(crate) fn get_live(&self, key: BindKey) -> Option<Rc<dyn BindSink>> {
        let mut bindings = self.0.borrow_mut();
        let sink = bindings.get(key.0)?.sink.upgrade();
        if sink.is_none() {
            bindings.remove(key.0);
        }
        sink
    }
}

struct SourceBinding {
    source: Rc<dyn BindSource>,
    key: Option<BindKey>,
    last: Rc<dyn Snapshot>,
}

/// Upstream nodes of a node, each with the value observed last time.
#[derive(Default)]
pub struct SourceBindings(Vec<SourceBinding>);

impl SourceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls the current value of each distinct upstream node.
    ///
    /// Nodes that appear more than once are bound only once.
    pub fn from_upstreams(upstreams: &impl Upstreams) -> Self {
        let mut this = Self::new();
        for source in upstreams.sources() {
            let id = source.id();
            if this.0.iter().any(|b| b.source.id() == id) {
                continue;
            }
            let last = source.pull();
            this.0.push(SourceBinding {
                source,
                key: None,
                last,
            });
        }
        this
    }

    /// Registers `sink` as a dependent of every upstream node.
    pub fn link(&mut self, id: NodeId, sink: &Weak<dyn BindSink>) {
        for b in &mut self.0 {
            if b.key.is_none() {
                b.key = Some(b.source.link(id, sink.clone()));
            }
        }
    }
    pub fn unlink_all(self, id: NodeId) {
        for b in self.0 {
            if let Some(key) = b.key {
                b.source.unlink(key, id);
            }
        }
    }

    /// Pulls the current value of each upstream node and replaces the values that differ from the last observed ones.
    ///
    /// Returns `true` if any value has changed.
    ///
    /// Pulling may run derivations that read the node owning `this`, so `this` is not borrowed while pulling.
    pub fn refresh(this: &RefCell<Self>) -> bool {
        let mut updates = Vec::new();
        let mut index = 0;
        loop {
            let Some((source, last)) = this
                .borrow()
                .0
                .get(index)
                .map(|b| (b.source.clone(), b.last.clone()))
            else {
                break;
            };
            let value = source.pull();
            if !Snapshot::same_as(&*value, &*last) {
                updates.push((index, value));
            }
            index += 1;
        }
        let changed = !updates.is_empty();
        let mut this = this.borrow_mut();
        for (index, value) in updates {
            if let Some(b) = this.0.get_mut(index) {
                b.last = value;
            }
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
