use crate::{unwrapper, Computed, Signal, Sink, State, Upstreams};

#[test]
fn values_of_tuple() {
    let a = State::new(1);
    let b = Computed::new((a.clone(),), |(a,)| a.get() * 2);
    let c = State::new("x");
    let u = (a.clone(), b, c);
    let (a0, b0, c0) = u.values();
    assert_eq!(a0, 1);
    assert_eq!(b0.unwrap(), 2);
    assert_eq!(c0, "x");

    a.set(2);
    assert_eq!(u.values().1.unwrap(), 4);
}

#[test]
fn values_of_array_and_vec() {
    let a = State::new(1);
    let b = State::new(2);
    assert_eq!([a.clone(), b.clone()].values(), [1, 2]);
    assert_eq!(vec![b, a].values(), vec![2, 1]);
}

#[test]
fn sources_keep_duplicates() {
    let a = State::new(1);
    let u = (a.clone(), a.clone(), a);
    let ids: Vec<_> = u.sources().iter().map(|s| s.id()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|&id| id == ids[0]));
}

#[test]
fn unwrapper_passes_values() {
    let a = State::new(2);
    let b = State::new(5);
    let f = unwrapper::<(State<i32>, State<i32>), _>(|(a, b)| a + b);
    assert_eq!(f(&(a, b)), 7);
}

#[test]
fn sinks_is_restartable() {
    let a = State::new(1);
    let _c = Computed::new((a.clone(),), |(a,)| a.get());
    let _s = Sink::new((a.clone(),), |_| {});
    assert_eq!(a.sinks().count(), 2);
    assert_eq!(a.sinks().count(), 2);
}

#[test]
fn sinks_skips_dropped_while_iterating() {
    let a = State::new(1);
    let c0 = Computed::new((a.clone(),), |(a,)| a.get());
    let c1 = Computed::new((a.clone(),), |(a,)| a.get());
    let mut sinks = a.sinks();
    assert_eq!(sinks.next().map(|d| d.id()), Some(c0.id()));
    drop(c1);
    assert_eq!(sinks.next(), None);
    assert_eq!(a.sinks().count(), 1);
}

#[test]
fn dependent_debug() {
    let a = State::new(1);
    let c = Computed::new((a.clone(),), |(a,)| a.get());
    let d = Signal::sinks(&a).next().unwrap();
    assert_eq!(format!("{d:?}"), format!("computed {}", c.id()));
}

#[test]
fn dependent_does_not_keep_node_alive() {
    let a = State::new(1);
    let s = Sink::new((a.clone(),), |_| {});
    let d = a.sinks().next().unwrap();
    assert_eq!(d.id(), s.id());
    assert!(d.is_alive());

    drop(s);
    assert!(!d.is_alive());
    assert_eq!(a.sinks().count(), 0);
}
