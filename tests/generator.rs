use filum::{Error, Generator};

use std::panic::{catch_unwind, AssertUnwindSafe};

fn g() -> Generator<i32, f64> {
    Generator::new(|co| async move {
        co.yield_value(3).await;
        co.yield_value(4).await;
        -1.0
    })
}

fn h2() -> Generator<i32, String> {
    Generator::new(|_co| async move { String::from("result from h2()") })
}

fn h1() -> Generator<i32, String> {
    Generator::new(|co| async move { co.delegate(h2()).await })
}

fn f() -> Generator<i32, i32> {
    Generator::new(|co| async move {
        co.yield_value(1).await;
        co.yield_value(2).await;
        let gv = co.delegate(g()).await;
        assert_eq!(gv, -1.0);
        co.yield_value(5).await;
        let hv = co.delegate(h1()).await;
        assert_eq!(hv, "result from h2()");
        co.yield_value(6).await;
        -3
    })
}

#[test]
fn yield_and_return() {
    let mut gen = g();

    assert!(!gen.is_done());
    assert_eq!(
        gen.result(),
        Err(Error::NoValueReturned),
        "result must not be readable before the generator finished"
    );

    assert_eq!(gen.next(), Some(3));
    assert_eq!(gen.next(), Some(4));
    assert_eq!(gen.next(), None);

    assert!(gen.is_done());
    assert_eq!(gen.result(), Ok(-1.0));
}

#[test]
fn exhausted_generator_keeps_returning_none() {
    let mut gen = g();
    while gen.next().is_some() {}

    assert_eq!(gen.next(), None);
    assert_eq!(gen.next(), None);
    assert!(gen.is_done());
}

#[test]
fn next_and_done_agree() {
    let mut gen = g();
    loop {
        match gen.next() {
            Some(_) => assert!(!gen.is_done(), "a yield implies the generator is not done"),
            None => {
                assert!(gen.is_done(), "exhaustion implies the generator is done");
                break;
            }
        }
    }
}

#[test]
fn nested_delegation_with_immediate_return() {
    let mut outer = h1();

    assert_eq!(outer.next(), None, "h1 never yields");
    assert!(outer.is_done());
    assert_eq!(outer.result(), Ok(String::from("result from h2()")));
}

#[test]
fn mixed_yields_and_delegation() {
    let mut outer = f();

    let mut values = Vec::new();
    while let Some(value) = outer.next() {
        values.push(value);
    }

    assert_eq!(values, [1, 2, 3, 4, 5, 6]);
    assert_eq!(outer.result(), Ok(-3));
}

#[test]
fn delegation_is_transparent_to_iteration() {
    let mut outer = f();

    let values: Vec<i32> = outer.by_ref().collect();

    assert_eq!(values, [1, 2, 3, 4, 5, 6]);
    assert_eq!(outer.result(), Ok(-3));
}

#[test]
fn back_to_back_delegation_is_legal() {
    let mut outer: Generator<i32, String> = Generator::new(|co| async move {
        let first = co.delegate(h2()).await;
        let second = co.delegate(h2()).await;
        format!("{first}+{second}")
    });

    assert_eq!(outer.next(), None);
    assert_eq!(
        outer.result(),
        Ok(String::from("result from h2()+result from h2()"))
    );
}

#[test]
fn unit_return_generator() {
    let mut gen: Generator<i32> = Generator::new(|co| async move {
        co.yield_value(7).await;
    });

    assert_eq!(gen.next(), Some(7));
    assert_eq!(gen.next(), None);
    assert_eq!(gen.result(), Ok(()));
}

#[test]
fn body_panic_resurfaces_at_next() {
    let mut gen: Generator<i32> = Generator::new(|co| async move {
        co.yield_value(1).await;
        panic!("boom");
    });

    assert_eq!(gen.next(), Some(1));

    let payload = catch_unwind(AssertUnwindSafe(|| gen.next())).unwrap_err();
    let message = payload.downcast_ref::<&str>().copied().unwrap_or_default();
    assert_eq!(message, "boom");

    assert!(gen.is_done(), "a panicked generator reports done");
    assert_eq!(gen.next(), None);
}

#[test]
fn overlapping_delegation_is_a_double_await() {
    let mut outer: Generator<i32> = Generator::new(|co| async move {
        let a = Generator::<i32, i32>::new(|inner| async move {
            inner.yield_value(1).await;
            1
        });
        let b = Generator::<i32, i32>::new(|inner| async move {
            inner.yield_value(2).await;
            2
        });

        // Polling both delegations concurrently chains a second child
        // while the first is still mid-stream.
        let (_x, _y) = futures::join!(co.delegate(a), co.delegate(b));
    });

    let payload = catch_unwind(AssertUnwindSafe(|| outer.next())).unwrap_err();
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(
        message.contains("awaits on a second one"),
        "expected a double-await failure, got: {message}"
    );
}
