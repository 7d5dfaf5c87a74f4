//! A distance-ordered priority queue served by a fixed pool of worker
//! threads (spec section 5: "a plain priority queue + condvar; a worker pops
//! the nearest job and runs it to completion"). Shared by the terrain,
//! decoration and mesh worker pools -- each instantiates its own `JobPool<J>`
//! with its own job payload type and handler.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use ordered_float::OrderedFloat;

struct PrioritizedJob<J> {
    distance: OrderedFloat<f32>,
    job: J,
}

impl<J> PartialEq for PrioritizedJob<J> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl<J> Eq for PrioritizedJob<J> {}

impl<J> PartialOrd for PrioritizedJob<J> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<J> Ord for PrioritizedJob<J> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the closest job (smallest
        // distance) pops first.
        other.distance.cmp(&self.distance)
    }
}

/// State the condvar is paired with. `shutdown` lives inside the same lock
/// as the queue so a worker reading it and a `Drop` setting it can never
/// race across separate mutexes and miss a wakeup.
struct State<J> {
    queue: BinaryHeap<PrioritizedJob<J>>,
    shutdown: bool,
}

struct Shared<J> {
    state: Mutex<State<J>>,
    condvar: Condvar,
}

impl<J> Shared<J> {
    fn pop_or_wait(&self) -> Option<J> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(job) = state.queue.pop() {
                return Some(job.job);
            }
            if state.shutdown {
                return None;
            }
            state = self.condvar.wait(state).unwrap();
        }
    }
}

/// A pool of `num_threads` worker threads draining a shared priority queue.
pub struct JobPool<J> {
    shared: Arc<Shared<J>>,
    workers: Vec<JoinHandle<()>>,
}

impl<J: Send + 'static> JobPool<J> {
    pub fn new<F>(num_threads: usize, handler: F) -> Self
    where
        F: Fn(J) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: BinaryHeap::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
        });
        let handler = Arc::new(handler);

        let workers = (0..num_threads.max(1))
            .map(|i| {
                let shared = shared.clone();
                let handler = handler.clone();
                thread::Builder::new()
                    .name(format!("job-pool-worker-{i}"))
                    .spawn(move || {
                        while let Some(job) = shared.pop_or_wait() {
                            handler(job);
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        JobPool { shared, workers }
    }

    /// Enqueues `job`, to be popped by ascending `distance` (closest first).
    pub fn submit(&self, job: J, distance: f32) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.queue.push(PrioritizedJob {
                distance: OrderedFloat(distance),
                job,
            });
        }
        self.shared.condvar.notify_one();
    }

    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().unwrap().queue.len()
    }
}

impl<J> Drop for JobPool<J> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.condvar.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn heap_pops_in_ascending_distance_order() {
        let mut heap = BinaryHeap::new();
        heap.push(PrioritizedJob {
            distance: OrderedFloat(30.0),
            job: 30,
        });
        heap.push(PrioritizedJob {
            distance: OrderedFloat(10.0),
            job: 10,
        });
        heap.push(PrioritizedJob {
            distance: OrderedFloat(20.0),
            job: 20,
        });

        let order: Vec<i32> = std::iter::from_fn(|| heap.pop().map(|p| p.job)).collect();
        assert_eq!(order, vec![10, 20, 30]);
    }

    #[test]
    fn all_submitted_jobs_eventually_run() {
        let (tx, rx) = mpsc::channel();
        let pool = JobPool::new(2, move |job: i32| {
            tx.send(job).unwrap();
        });

        for i in 0..16 {
            pool.submit(i, i as f32);
        }

        drop(pool);

        let mut results: Vec<i32> = rx.into_iter().collect();
        results.sort();
        assert_eq!(results, (0..16).collect::<Vec<_>>());
    }
}
