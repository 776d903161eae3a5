use std::{
    fmt,
    rc::{Rc, Weak},
};

use crate::core::{BindKey, BindSink, BindSource, NodeId, NodeKind, SinkBindings};

#[cfg(test)]
mod tests;

pub(crate) mod sealed {
    use std::rc::Rc;

    use crate::core::BindSource;

    pub trait Sealed {
        fn to_source(&self) -> Rc<dyn BindSource>;
    }
}

/// A node whose value can be observed by [`Computed`](crate::Computed) and [`Sink`](crate::Sink).
///
/// This trait is sealed. It is implemented only by [`State`](crate::State) and [`Computed`](crate::Computed).
///
/// ```compile_fail
/// use sigweak::{NodeId, Signal, Sinks};
///
/// #[derive(Clone)]
/// struct MySignal;
///
/// impl Signal for MySignal {
///     type Value = ();
///     fn get(&self) {}
///     fn id(&self) -> NodeId { todo!() }
///     fn sinks(&self) -> Sinks { todo!() }
/// }
/// ```
pub trait Signal: sealed::Sealed + Clone + 'static {
    type Value;

    /// Returns the current value.
    fn get(&self) -> Self::Value;

    fn id(&self) -> NodeId;

    /// Returns the nodes currently linked to this signal as dependents.
    ///
    /// Dependents that have been dropped are skipped and removed from this signal.
    fn sinks(&self) -> Sinks;
}

/// The list of signals a [`Computed`](crate::Computed) or [`Sink`](crate::Sink) depends on.
///
/// The list is passed to the derivation function or callback as is, including duplicates.
pub trait Upstreams: 'static {
    type Values;

    fn sources(&self) -> Vec<Rc<dyn BindSource>>;

    /// Returns the current value of each signal in order.
    fn values(&self) -> Self::Values;
}

impl Upstreams for () {
    type Values = ();
    fn sources(&self) -> Vec<Rc<dyn BindSource>> {
        Vec::new()
    }
    fn values(&self) -> Self::Values {}
}

macro_rules! impl_upstreams_for_tuple {
    ($($t:ident $i:tt),*) => {
        impl<$($t: Signal),*> Upstreams for ($($t,)*) {
            type Values = ($($t::Value,)*);
            fn sources(&self) -> Vec<Rc<dyn BindSource>> {
                vec![$(self.$i.to_source()),*]
            }
            fn values(&self) -> Self::Values {
                ($(self.$i.get(),)*)
            }
        }
    };
}
impl_upstreams_for_tuple!(S0 0);
impl_upstreams_for_tuple!(S0 0, S1 1);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2, S3 3);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2, S3 3, S4 4);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6);
impl_upstreams_for_tuple!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7);

impl<S: Signal, const N: usize> Upstreams for [S; N] {
    type Values = [S::Value; N];
    fn sources(&self) -> Vec<Rc<dyn BindSource>> {
        self.iter().map(|s| s.to_source()).collect()
    }
    fn values(&self) -> Self::Values {
        std::array::from_fn(|i| self[i].get())
    }
}
impl<S: Signal> Upstreams for Vec<S> {
    type Values = Vec<S::Value>;
    fn sources(&self) -> Vec<Rc<dyn BindSource>> {
        self.iter().map(|s| s.to_source()).collect()
    }
    fn values(&self) -> Self::Values {
        self.iter().map(|s| s.get()).collect()
    }
}

/// Convert a function of upstream values into a function of upstream signals.
///
/// ```
/// use sigweak::{unwrapper, Computed, State};
///
/// let a = State::new(2);
/// let b = State::new(3);
/// let f = unwrapper::<(State<i32>, State<i32>), _>(|(a, b)| a * b);
/// let c = Computed::new((a, b), f);
/// assert_eq!(c.get().unwrap(), 6);
/// ```
pub fn unwrapper<U: Upstreams, R>(f: impl Fn(U::Values) -> R) -> impl Fn(&U) -> R {
    move |upstreams| f(upstreams.values())
}

/// A node linked to a signal as a dependent.
///
/// Does not keep the node alive.
#[derive(Clone)]
pub struct Dependent {
    id: NodeId,
    kind: NodeKind,
    sink: Weak<dyn BindSink>,
}

impl Dependent {
    fn new(sink: &Rc<dyn BindSink>) -> Self {
        Self {
            id: sink.id(),
            kind: sink.kind(),
            sink: Rc::downgrade(sink),
        }
    }
    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns `true` if the node has not been dropped.
    pub fn is_alive(&self) -> bool {
        self.sink.strong_count() > 0
    }
}
impl PartialEq for Dependent {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
impl Eq for Dependent {}

impl fmt::Debug for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Iterator over the live dependents of a signal, returned by [`Signal::sinks`].
///
/// Each dependent is checked when the iterator reaches it,
/// so dependents dropped while iterating are not yielded.
pub struct Sinks {
    sinks: SinkBindings,
    keys: std::vec::IntoIter<BindKey>,
}

impl Sinks {
    pub(crate) fn new(sinks: &SinkBindings) -> Self {
        Self {
            sinks: sinks.clone(),
            keys: sinks.keys().into_iter(),
        }
    }
}
impl Iterator for Sinks {
    type Item = Dependent;

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.keys.by_ref() {
            if let Some(sink) = self.sinks.get_live(key) {
                return Some(Dependent::new(&sink));
            }
        }
        None
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}
