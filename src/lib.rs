pub mod core;

mod computed;
mod failure;
mod same_value;
mod signal;
mod sink;
mod state;

#[cfg(test)]
mod test_helpers;
#[cfg(doctest)]
mod tests_readme;

pub use computed::*;
pub use crate::core::{NodeId, NodeKind, Runtime, RuntimeExistsError, RuntimeOptions};
pub use failure::Failure;
pub use same_value::SameValue;
pub use signal::{unwrapper, Dependent, Signal, Sinks, Upstreams};
pub use sink::{Sink, Slot};
pub use state::State;
