use filum::{Generator, SendGenerator};

use std::panic::{catch_unwind, AssertUnwindSafe};

fn is_prime(x: u64) -> bool {
    if x < 2 {
        return false;
    }
    if x == 2 {
        return true;
    }
    if x % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= x {
        if x % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

fn get_primes(start: u64) -> SendGenerator<u64, u64> {
    SendGenerator::new(move |co| async move {
        let mut number = start;
        loop {
            if is_prime(number) {
                number = co.yield_value(number).await;
            }
            number += 1;
        }
    })
}

#[test]
fn successive_primes() {
    let mut primes = get_primes(10);

    assert_eq!(primes.next(), Some(11), "first prime at or after 10");

    assert_eq!(primes.send(10), Some(11));
    assert_eq!(primes.send(100), Some(101));
    assert_eq!(primes.send(1_000), Some(1_009));
    assert_eq!(primes.send(10_000), Some(10_007));

    assert!(!primes.is_done(), "the search loop never finishes");
}

#[test]
#[should_panic(expected = "returns no value")]
fn resuming_a_send_point_without_a_send_panics() {
    let mut primes = get_primes(10);

    assert_eq!(primes.next(), Some(11));

    // The body is suspended waiting for a sent value; a bare next() has
    // nothing to resume it with.
    primes.next();
}

#[test]
fn typed_send_generator_returns_a_value() {
    let mut gen: SendGenerator<i32, i32, &'static str> = SendGenerator::new(|co| async move {
        let first = co.yield_value(1).await;
        if first > 0 {
            "positive"
        } else {
            "negative"
        }
    });

    assert_eq!(gen.next(), Some(1));
    assert_eq!(gen.send(5), None, "the body returns after one send");
    assert!(gen.is_done());
    assert_eq!(gen.result(), Ok("positive"));
}

#[test]
fn send_after_completion_keeps_returning_none() {
    let mut gen: SendGenerator<i32, i32, i32> = SendGenerator::new(|co| async move {
        let sent = co.yield_value(0).await;
        sent * 2
    });

    assert_eq!(gen.next(), Some(0));
    assert_eq!(gen.send(21), None);
    assert_eq!(gen.result(), Ok(42));

    assert_eq!(gen.send(7), None);
    assert_eq!(gen.send(8), None);
}

#[test]
fn delegating_to_a_send_generator_is_refused() {
    let mut outer: Generator<u64> = Generator::new(|co| async move {
        co.delegate_send(get_primes(10)).await;
    });

    let payload = catch_unwind(AssertUnwindSafe(|| outer.next())).unwrap_err();
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(
        message.contains("is not implemented"),
        "expected the not-implemented refusal, got: {message}"
    );
    assert!(outer.is_done());
}

#[test]
fn sent_values_accumulate_in_the_body() {
    let mut gen: SendGenerator<i32, i32, i32> = SendGenerator::new(|co| async move {
        let mut total = 0;
        for i in 0..3 {
            total += co.yield_value(i).await;
        }
        total
    });

    assert_eq!(gen.next(), Some(0));
    assert_eq!(gen.send(10), Some(1));
    assert_eq!(gen.send(20), Some(2));
    assert_eq!(gen.send(30), None);
    assert_eq!(gen.result(), Ok(60));
}
