
use self::test_utils::*;
use sigweak::*;

#[test]
fn diamond() {
    let mut rt = Runtime::new();
    let a = State::new(1);
    let b = Computed::new((a.clone(),), |(a,)| a.get() + 1);
    let c = Computed::new((a.clone(),), |(a,)| a.get() * 10);
    let d = Computed::try_new((b.clone(), c.clone()), |(b, c)| Ok(b.get()? + c.get()?));
    let r = record(&d);

    a.set(2);
    rt.update();
    assert_eq!(r.take().into_iter().map(|x| x.unwrap()).collect::<Vec<_>>(), [23]);

    a.set(3);
    a.set(4);
    rt.update();
    assert_eq!(r.take().into_iter().map(|x| x.unwrap()).collect::<Vec<_>>(), [45]);
}

#[test]
fn only_changes_are_observed() {
    let mut rt = Runtime::new();
    let a = State::new(0);
    let parity = Computed::new((a.clone(),), |(a,)| if a.get() % 2 == 0 { "even" } else { "odd" });
    let r = record(&parity);

    for i in 1..=5 {
        a.set(i);
        rt.update();
    }
    assert_eq!(
        r.take().into_iter().map(|x| x.unwrap()).collect::<Vec<_>>(),
        ["odd", "even", "odd", "even", "odd"]
    );

    a.set(7);
    rt.update();
    assert!(r.take().is_empty());
}

#[test]
fn record_state() {
    let mut rt = Runtime::new();
    let a = State::new(String::from("a"));
    let r = record(&a);

    a.set("b".into());
    a.set("c".into());
    rt.update();
    a.set("d".into());
    rt.update();
    assert_eq!(r.take(), ["c", "d"]);
}

#[test]
fn failure_is_observed_once() {
    let mut rt = Runtime::new();
    let a = State::new(1);
    let b = Computed::try_new((a.clone(),), |(a,)| {
        let a = a.get();
        if a == 0 {
            Err(Failure::msg("division by zero"))
        } else {
            Ok(100 / a)
        }
    });
    let r = record(&b);

    a.set(0);
    rt.update();
    a.set(0);
    rt.update();
    let values = r.take();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].as_ref().unwrap_err().to_string(), "division by zero");

    a.set(4);
    rt.update();
    assert_eq!(r.take().into_iter().map(|x| x.unwrap()).collect::<Vec<_>>(), [25]);
}

#[test]
fn sinks_of_vec_upstreams() {
    let mut rt = Runtime::new();
    let items: Vec<_> = (0..3).map(State::new).collect();
    let total = Computed::new(items.clone(), |items| items.iter().map(|s| s.get()).sum::<i32>());
    let r = record(&total);
    for item in &items {
        assert_eq!(item.sinks().count(), 1);
    }

    items[1].set(10);
    items[2].set(20);
    rt.update();
    assert_eq!(r.take().into_iter().map(|x| x.unwrap()).collect::<Vec<_>>(), [30]);
}

#[test]
fn runtime_options_from_json() {
    let options: RuntimeOptions = serde_json::from_str(r#"{"turn_limit":2}"#).unwrap();
    let mut rt = Runtime::with_options(options);
    let a = State::new(0);
    let b = State::new(0);
    let c = State::new(0);
    let _s0 = Sink::new((a.clone(),), {
        let b = b.clone();
        move |(a,)| b.set(a.get())
    });
    let _s1 = Sink::new((b.clone(),), {
        let c = c.clone();
        move |(b,)| c.set(b.get())
    });
    let r = record(&c);

    a.set(1);
    rt.update();
    assert!(r.take().is_empty());
    assert!(!rt.is_idle());
    rt.update();
    assert_eq!(r.take(), [1]);
}
