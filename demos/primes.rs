//! Successive primes through a send-generator: each `send(v)` restarts
//! the search at `v`, so the generator produces the first prime at or
//! after every power of ten.

use filum::SendGenerator;

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

fn main() {
    env_logger::init();

    let mut primes = get_primes(10);
    primes.next();

    for exponent in 0..8 {
        let base = 10u64.pow(exponent);
        match primes.send(base) {
            Some(prime) => println!("first prime at or after {base}: {prime}"),
            None => break,
        }
    }
}
