//! A task that prints, sleeps a second on the engine clock, and prints
//! again. Run with `RUST_LOG=trace` to watch the engine's scheduling
//! decisions.

use filum::{Engine, Task};

fn main() {
    env_logger::init();

    let engine = Engine::new();

    let hello = Task::new(|co| async move {
        println!("hello ...");
        co.sleep(1000).await;
        println!("... world");
    });

    engine.schedule_task(&hello, 0);
    engine.transfer_ownership(hello);

    engine.run();
}
