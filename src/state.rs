use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{BindKey, BindSink, BindSource, NodeId, SinkBindings, Snapshot},
    signal::sealed::Sealed,
    SameValue, Signal, Sinks,
};


/// A mutable source value.
///
/// Similar to `Rc<RefCell<T>>`, but with added functionality to observe changes.
/// Clones refer to the same state.
#[derive_ex(Clone, bound())]
pub struct State<T: 'static>(Rc<StateNode<T>>);

impl<T: 'static> State<T> {
    /// Create a new `State` with the given initial value.
    pub fn new(value: T) -> Self {
        Self(Rc::new(StateNode {
            id: NodeId::new(),
            sinks: SinkBindings::new(),
            value: RefCell::new(value),
        }))
    }

    /// Gets the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    /// Calls `f` with a reference to the current value.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.0.value.borrow())
    }

    /// Sets the value of the state and notifies the dependents,
    /// unless the specified value is the [same value](SameValue) as the current one.
    ///
    /// All dependent [`Computed`](crate::Computed) are marked dirty before this method returns.
    pub fn set(&self, value: T)
    where
        T: SameValue,
    {
        let old = {
            let mut this_value = self.0.value.borrow_mut();
            if this_value.same_value(&value) {
                return;
            }
            std::mem::replace(&mut *this_value, value)
        };
        drop(old);
        tracing::trace!(id = %self.0.id, "state changed");
        self.0.sinks.notify();
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Returns the dependents of this state.
    pub fn sinks(&self) -> Sinks {
        Sinks::new(&self.0.sinks)
    }
}
impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T> Serialize for State<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&*value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
impl<'de, T> Deserialize<'de> for State<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<State<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(State::new)
    }
}

impl<T: Clone + SameValue + 'static> Sealed for State<T> {
    fn to_source(&self) -> Rc<dyn BindSource> {
        self.0.clone()
    }
}
impl<T: Clone + SameValue + 'static> Signal for State<T> {
    type Value = T;

    fn get(&self) -> T {
        self.get()
    }
    fn id(&self) -> NodeId {
        self.id()
    }
    fn sinks(&self) -> Sinks {
        self.sinks()
    }
}

struct StateNode<T: 'static> {
    id: NodeId,
    sinks: SinkBindings,
    value: RefCell<T>,
}

impl<T: Clone + SameValue + 'static> BindSource for StateNode<T> {
    fn id(&self) -> NodeId {
        self.id
    }
    fn pull(&self) -> Rc<dyn Snapshot> {
        Rc::new(self.value.borrow().clone())
    }
    fn link(&self, id: NodeId, sink: Weak<dyn BindSink>) -> BindKey {
        self.sinks.link(id, sink)
    }
    fn unlink(&self, key: BindKey, id: NodeId) {
        self.sinks.unlink(key, id)
    }
}
