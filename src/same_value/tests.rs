use std::rc::Rc;

use rstest::rstest;

use crate::SameValue;

#[rstest]
#[case(0.0, 0.0, true)]
#[case(1.5, 1.5, true)]
#[case(f64::NAN, f64::NAN, true)]
#[case(0.0, -0.0, false)]
#[case(f64::INFINITY, f64::INFINITY, true)]
#[case(f64::NAN, 0.0, false)]
#[case(1.0, 2.0, false)]
fn f64_same_value(#[case] a: f64, #[case] b: f64, #[case] expected: bool) {
    assert_eq!(a.same_value(&b), expected);
    assert_eq!(b.same_value(&a), expected);
}

#[test]
fn f32_same_value() {
    assert!(f32::NAN.same_value(&f32::NAN));
    assert!(!0.0f32.same_value(&-0.0f32));
}

#[test]
fn rc_is_compared_by_pointer() {
    let a = Rc::new(5);
    let b = Rc::new(5);
    assert!(a.same_value(&a.clone()));
    assert!(!a.same_value(&b));
}

#[test]
fn string_is_compared_by_value() {
    assert!(String::from("abc").same_value(&String::from("abc")));
    assert!("abc".same_value(&"abc"));
    assert!(!"abc".same_value(&"abd"));
}

#[test]
fn option_and_tuple() {
    assert!(Some(f64::NAN).same_value(&Some(f64::NAN)));
    assert!(!Some(1).same_value(&None));
    assert!((1, 0.0).same_value(&(1, 0.0)));
    assert!(!(1, 0.0).same_value(&(1, -0.0)));
}
