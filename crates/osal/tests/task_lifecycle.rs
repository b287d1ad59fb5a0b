#![cfg(feature = "host")]

//! Task wrapper lifecycle against the host backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use peregrine_osal::semaphore::CountingSemaphore;
use peregrine_osal::thread::{Priority, Task, TaskRegistry, TaskState};
use peregrine_osal::Error;

#[test]
fn configured_task_runs_and_joins() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let mut task = Task::new();
    task.initialize(
        move || flag.store(true, Ordering::Relaxed),
        Priority::Level2,
        64 * 1024,
        "lifecycle",
    )
    .unwrap();

    let id = task.start().unwrap();
    assert_eq!(task.id(), Some(id));
    assert_eq!(task.state(), TaskState::Running);
    assert!(task.native_id().is_some());

    task.join().unwrap();
    assert_eq!(task.state(), TaskState::Terminated);
    assert!(ran.load(Ordering::Relaxed));
}

#[test]
fn start_twice_is_rejected() {
    let mut task = Task::new();
    task.initialize(|| {}, Priority::Level1, 0, "once").unwrap();
    task.start().unwrap();
    assert_eq!(task.start(), Err(Error::InvalidState));
    task.join().unwrap();
}

#[test]
fn suspend_is_unsupported_on_the_host_backend() {
    let sem = Arc::new(CountingSemaphore::new(1));
    sem.try_acquire();
    let gate = sem.clone();

    let mut task = Task::new();
    task.initialize(move || gate.acquire(), Priority::Level4, 0, "gated")
        .unwrap();
    task.start().unwrap();

    assert_eq!(task.suspend(), Err(Error::NotSupported));
    assert_eq!(task.resume(), Err(Error::NotSupported));

    sem.release(1);
    task.join().unwrap();
}

#[test]
fn registry_tracks_started_tasks() {
    let barrier = Arc::new(CountingSemaphore::new(2));
    barrier.try_acquire();
    barrier.try_acquire();

    let mut registry = TaskRegistry::new();
    let mut tasks = Vec::new();
    for name in ["alpha", "beta"] {
        let gate = barrier.clone();
        let mut task = Task::new();
        task.initialize(move || gate.acquire(), Priority::Level3, 0, name)
            .unwrap();
        task.start().unwrap();
        registry.register(&task).unwrap();
        tasks.push(task);
    }

    assert_eq!(registry.len(), 2);
    let beta = registry.find_by_name("beta").unwrap();
    assert_eq!(beta.priority, Priority::Level3);
    assert!(registry.get(beta.id).is_some());

    // Double registration of a live id fails closed.
    assert_eq!(registry.register(&tasks[0]), Err(Error::InvalidState));

    let alpha_id = registry.find_by_name("alpha").unwrap().id;
    registry.unregister(alpha_id).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.find_by_name("alpha").is_none());

    barrier.release(2);
    for mut task in tasks {
        task.join().unwrap();
    }
}
