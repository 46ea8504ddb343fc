use filum::{Engine, Task, Timer, VirtualTimer};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn virtual_engine() -> (Rc<VirtualTimer>, Engine) {
    let clock = Rc::new(VirtualTimer::new());
    let engine = Engine::with_timer(clock.clone());
    (clock, engine)
}

#[test]
fn run_with_empty_queue_returns_immediately() {
    let (clock, engine) = virtual_engine();

    engine.run();

    assert_eq!(clock.now(), 0, "an idle run must not advance the clock");
}

#[test]
fn sleeping_task_wakes_at_its_deadline() {
    let (clock, engine) = virtual_engine();
    let log = Rc::new(RefCell::new(Vec::new()));

    let task = Task::new({
        let log = log.clone();
        let clock = clock.clone();
        move |co| async move {
            log.borrow_mut().push(("before sleep", clock.now()));
            co.sleep(1000).await;
            log.borrow_mut().push(("after sleep", clock.now()));
        }
    });

    engine.schedule_task(&task, 0);
    engine.run();

    assert!(task.is_done());
    assert_eq!(*log.borrow(), [("before sleep", 0), ("after sleep", 1000)]);
}

#[test]
fn wall_clock_sleep_blocks_at_least_the_duration() {
    let engine = Engine::new();
    let start = Instant::now();

    let task = Task::new(|co| async move {
        co.sleep(50).await;
    });

    engine.schedule_task(&task, 0);
    engine.run();

    assert!(
        start.elapsed() >= Duration::from_millis(50),
        "sleep should wait at least the specified duration"
    );
}

#[test]
fn wakeups_are_never_early() {
    let (clock, engine) = virtual_engine();

    let task = Task::new({
        let clock = clock.clone();
        move |co| async move {
            for delay in [1, 10, 250] {
                let asked_at = clock.now();
                co.sleep(delay).await;
                assert!(
                    clock.now() >= asked_at + delay,
                    "woke at {} but the deadline was {}",
                    clock.now(),
                    asked_at + delay
                );
            }
        }
    });

    engine.schedule_task(&task, 0);
    engine.run();

    assert!(task.is_done());
}

#[test]
fn same_deadline_fires_in_insertion_order() {
    let (_clock, engine) = virtual_engine();
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut tasks = Vec::new();
    for name in ["a", "b", "c"] {
        let task = Task::new({
            let order = order.clone();
            move |_co| async move {
                order.borrow_mut().push(name);
            }
        });
        engine.schedule_task(&task, 10);
        tasks.push(task);
    }

    engine.run();

    assert_eq!(*order.borrow(), ["a", "b", "c"]);
}

#[test]
fn schedule_and_is_scheduled_agree() {
    let (_clock, engine) = virtual_engine();

    let task = Task::new(|_co| async move {});
    let handle = task.frame_handle();

    assert!(!engine.is_scheduled(&handle));
    engine.schedule_task(&task, 5);
    assert!(engine.is_scheduled(&handle));

    engine.run();
    assert!(
        !engine.is_scheduled(&handle),
        "a consumed event must leave the queue"
    );
}

#[test]
fn run_one_round_executes_a_single_tick() {
    let (clock, engine) = virtual_engine();
    let log = Rc::new(RefCell::new(Vec::new()));

    let task = Task::new({
        let log = log.clone();
        move |co| async move {
            log.borrow_mut().push("first");
            co.sleep(100).await;
            log.borrow_mut().push("second");
        }
    });

    engine.schedule_task(&task, 0);

    engine.run_one_round();
    assert_eq!(*log.borrow(), ["first"]);
    assert!(!task.is_done());

    engine.run_one_round();
    assert_eq!(*log.borrow(), ["first", "second"]);
    assert!(task.is_done());
    assert_eq!(clock.now(), 100);
}

#[test]
fn engine_sleep_awaiter_uses_call_time_deadline() {
    let (clock, engine) = virtual_engine();

    let task = Task::new({
        let clock = clock.clone();
        let engine = engine.clone();
        move |_co| async move {
            let awaiter = engine.sleep(40);
            awaiter.await;
            assert_eq!(clock.now(), 40);
        }
    });

    engine.schedule_task(&task, 0);
    engine.run();

    assert!(task.is_done());
}

#[test]
fn owned_tasks_are_swept_after_completion() {
    let (_clock, engine) = virtual_engine();
    let finished = Rc::new(RefCell::new(false));

    let task = Task::new({
        let finished = finished.clone();
        move |co| async move {
            co.sleep(10).await;
            *finished.borrow_mut() = true;
        }
    });
    let handle = task.handle();

    engine.schedule_task(&task, 0);
    engine.transfer_ownership(task);
    engine.run();

    assert!(*finished.borrow());
    assert!(handle.is_done());
}
