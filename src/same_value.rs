use std::{rc::Rc, sync::Arc};

#[cfg(test)]
mod tests;

/// Equality used to decide whether an observed value has changed.
///
/// Follows the semantics of JavaScript's `Object.is`:
/// values are compared by identity, not by deep equality.
///
/// - Plain data (integers, `bool`, `char`, strings) is compared by value.
/// - `f32` and `f64` treat `NaN` as equal to itself and distinguish `+0.0` from `-0.0`.
/// - `Rc` and `Arc` are compared by pointer.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! impl_same_value_by_eq {
    ($($t:ty),*) => {
        $(
            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}
impl_same_value_by_eq!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    String,
    &'static str
);

macro_rules! impl_same_value_for_float {
    ($($t:ty),*) => {
        $(
            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    if self.is_nan() {
                        other.is_nan()
                    } else {
                        self.to_bits() == other.to_bits()
                    }
                }
            }
        )*
    };
}
impl_same_value_for_float!(f32, f64);

impl<T: ?Sized> SameValue for Rc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}
impl<T: ?Sized> SameValue for Arc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}
impl<T: SameValue, E: SameValue> SameValue for Result<T, E> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Ok(a), Ok(b)) => a.same_value(b),
            (Err(a), Err(b)) => a.same_value(b),
            _ => false,
        }
    }
}

macro_rules! impl_same_value_for_tuple {
    ($($t:ident $i:tt),*) => {
        impl<$($t: SameValue),*> SameValue for ($($t,)*) {
            fn same_value(&self, other: &Self) -> bool {
                $(self.$i.same_value(&other.$i))&&*
            }
        }
    };
}
impl_same_value_for_tuple!(T0 0);
impl_same_value_for_tuple!(T0 0, T1 1);
impl_same_value_for_tuple!(T0 0, T1 1, T2 2);
impl_same_value_for_tuple!(T0 0, T1 1, T2 2, T3 3);
