//! Property-style tests for the queue core, driven by seeded generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use taskmq::core::queue::TaskQueue;
use taskmq::core::result::{ResultStatus, TaskResult};
use taskmq::core::task::Task;

#[test]
fn dequeue_priorities_are_monotonically_non_decreasing() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let queue = TaskQueue::new("ordered");
        let count = rng.gen_range(1..200);
        for _ in 0..count {
            queue.enqueue(Arc::new(Task::new("", rng.gen_range(-1000..1000))));
        }

        let drained: Vec<i32> = std::iter::from_fn(|| queue.dequeue())
            .map(|t| t.priority())
            .collect();
        assert_eq!(drained.len(), count);
        assert!(
            drained.windows(2).all(|w| w[0] <= w[1]),
            "priorities out of order: {drained:?}"
        );
    }
}

#[test]
fn concurrent_dequeues_deliver_each_task_at_most_once() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const TASKS_PER_PRODUCER: usize = 250;
    const TOTAL: usize = PRODUCERS * TASKS_PER_PRODUCER;

    let queue = Arc::new(TaskQueue::new("contended"));
    let delivered = Arc::new(AtomicUsize::new(0));

    let mut per_consumer: Vec<Vec<Uuid>> = Vec::new();
    std::thread::scope(|scope| {
        for p in 0..PRODUCERS {
            let queue = Arc::clone(&queue);
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(p as u64);
                for _ in 0..TASKS_PER_PRODUCER {
                    queue.enqueue(Arc::new(Task::new("", rng.gen_range(-50..50))));
                }
            });
        }

        let mut handles = Vec::new();
        for _ in 0..CONSUMERS {
            let queue = Arc::clone(&queue);
            let delivered = Arc::clone(&delivered);
            handles.push(scope.spawn(move || {
                let mut seen = Vec::new();
                while delivered.load(Ordering::Acquire) < TOTAL {
                    match queue.dequeue() {
                        Some(task) => {
                            seen.push(task.id());
                            delivered.fetch_add(1, Ordering::AcqRel);
                        }
                        None => std::thread::yield_now(),
                    }
                }
                seen
            }));
        }
        per_consumer = handles.into_iter().map(|h| h.join().unwrap()).collect();
    });

    let mut all: Vec<Uuid> = per_consumer.into_iter().flatten().collect();
    assert_eq!(all.len(), TOTAL);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), TOTAL, "some task was delivered twice");
    assert!(queue.dequeue().is_none());
}

#[test]
fn enqueues_minus_dequeues_equals_task_count() {
    let mut rng = StdRng::seed_from_u64(11);
    let queue = TaskQueue::new("conserved");
    let mut enqueued = 0usize;
    let mut dequeued = 0usize;

    for _ in 0..2000 {
        if rng.gen_bool(0.6) {
            queue.enqueue(Arc::new(Task::new("", rng.gen_range(-10..10))));
            enqueued += 1;
        } else if queue.dequeue().is_some() {
            dequeued += 1;
        }
        assert_eq!(queue.task_count(), enqueued - dequeued);
    }
}

#[test]
fn resubmitted_results_keep_only_the_latest() {
    let mut rng = StdRng::seed_from_u64(13);
    let queue = TaskQueue::new("overwrites");

    let ids: Vec<Uuid> = (0..20).map(|_| Uuid::new_v4()).collect();
    let mut latest = std::collections::HashMap::new();
    for round in 0..200 {
        let id = ids[rng.gen_range(0..ids.len())];
        let output = format!("out-{round}");
        let status = if rng.gen_bool(0.5) {
            ResultStatus::Success
        } else {
            ResultStatus::Failure
        };
        queue.add_result(TaskResult::new(id, output.clone(), status));
        latest.insert(id, (output, status));
    }

    assert_eq!(queue.result_count(), latest.len());
    for (id, (output, status)) in latest {
        let stored = queue.get_result(id).unwrap();
        assert_eq!(stored.output(), output);
        assert_eq!(stored.status(), status);
    }
}

#[test]
fn results_never_leak_across_queues() {
    let a = TaskQueue::new("a");
    let b = TaskQueue::new("b");
    let task_id = Uuid::new_v4();

    a.add_result(TaskResult::new(task_id, "belongs to a", ResultStatus::Success));
    assert!(a.get_result(task_id).is_some());
    assert!(b.get_result(task_id).is_none());
}

#[test]
fn equal_priorities_do_not_make_tasks_equal() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..100 {
        let priority = rng.gen_range(-100..100);
        let a = Task::new("same", priority);
        let b = Task::new("same", priority);
        assert_ne!(a, b);
        assert_eq!(a, Task::restore(a.id(), "", priority, a.status()));
    }
}
