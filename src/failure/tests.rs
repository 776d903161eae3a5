use std::error::Error;

use parse_display::Display;

use crate::{Failure, SameValue};

#[derive(Display, Debug)]
#[display("custom: {0}")]
struct CustomError(u32);

impl Error for CustomError {}

#[test]
fn display() {
    assert_eq!(Failure::new(CustomError(5)).to_string(), "custom: 5");
    assert_eq!(Failure::msg("test").to_string(), "test");
}

#[test]
fn downcast() {
    let f = Failure::new(CustomError(5));
    assert!(f.is::<CustomError>());
    assert_eq!(f.downcast_ref::<CustomError>().map(|e| e.0), Some(5));
    assert!(Failure::msg("test").downcast_ref::<CustomError>().is_none());
}

#[test]
fn same_value_is_identity() {
    let f0 = Failure::msg("test");
    let f1 = f0.clone();
    let f2 = Failure::msg("test");
    assert!(f0.same_value(&f1));
    assert!(!f0.same_value(&f2));
}
