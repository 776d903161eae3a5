use std::{error::Error, fmt, rc::Rc};

use parse_display::Display;

use crate::SameValue;

#[cfg(test)]
mod tests;

/// An error returned by a derivation or a sink callback.
///
/// A `Failure` is shared, not copied: clones refer to the same error,
/// and two failures are the [same value](SameValue) only if one is a clone of the other.
#[derive(Clone)]
pub struct Failure(Rc<dyn Error>);

impl Failure {
    pub fn new(e: impl Error + 'static) -> Self {
        Self(Rc::new(e))
    }

    /// Create a `Failure` from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(MessageError(message.to_string()))
    }

    pub fn get_ref(&self) -> &(dyn Error + 'static) {
        &*self.0
    }
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.0.is::<E>()
    }
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }
}
impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}
impl SameValue for Failure {
    fn same_value(&self, other: &Self) -> bool {
        Failure::ptr_eq(self, other)
    }
}

#[derive(Display, Debug)]
#[display("{0}")]
struct MessageError(String);

impl Error for MessageError {}
