// Background task runner: one worker thread per action, results posted back
// to the UI thread through a channel that the frame loop drains.

use crate::error::VenvError;
use crate::models::{TaskKind, TaskMessage, TaskSuccess};
use eframe::egui;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long the exit path waits for outstanding workers
pub const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Spawns workers and collects their completion messages.
/// Owned by the UI thread; workers only ever touch the sending half.
pub struct TaskRunner {
    /// Cloned into every worker
    tx: Sender<TaskMessage>,
    /// Drained once per frame by [`TaskRunner::poll`]
    rx: Receiver<TaskMessage>,
    /// Handles of workers that may still be running
    workers: Vec<JoinHandle<()>>,
    /// Id handed to the next spawned task
    next_id: u64,
    /// Used to wake the UI when a worker finishes
    repaint: Option<egui::Context>,
}

impl TaskRunner {
    /// Creates a runner. `repaint` is the egui context to wake on completion;
    /// tests pass `None` and poll by hand.
    pub fn new(repaint: Option<egui::Context>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            workers: Vec::new(),
            next_id: 1,
            repaint,
        }
    }

    /// Runs `work` on a fresh thread and returns the task id.
    /// Exactly one [`TaskMessage`] with this id is delivered later, whether
    /// the work succeeds, fails, or the thread cannot even be started.
    pub fn spawn<F>(&mut self, kind: TaskKind, env_name: &str, work: F) -> u64
    where
        F: FnOnce() -> Result<TaskSuccess, VenvError> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let name = env_name.to_string();
        let thread_name = format!("{:?}-{}", kind, env_name).to_lowercase();

        log::info!("task {} started: {:?} '{}'", id, kind, env_name);
        let spawned = thread::Builder::new().name(thread_name).spawn(move || {
            let started = Instant::now();
            let result = work();
            match &result {
                Ok(_) => log::info!("task {} finished in {:?}", id, started.elapsed()),
                Err(e) => log::warn!("task {} failed after {:?}: {}", id, started.elapsed(), e),
            }
            // The receiver only goes away at shutdown; nothing left to notify then
            let _ = tx.send(TaskMessage {
                id,
                kind,
                env_name: name,
                result,
            });
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });

        match spawned {
            Ok(handle) => self.workers.push(handle),
            Err(source) => {
                log::error!("could not start worker for task {}: {}", id, source);
                let _ = self.tx.send(TaskMessage {
                    id,
                    kind,
                    env_name: env_name.to_string(),
                    result: Err(VenvError::Spawn {
                        program: "worker thread".to_string(),
                        source,
                    }),
                });
            }
        }
        id
    }

    /// Drains completion messages without blocking. Call on the UI thread.
    pub fn poll(&mut self) -> Vec<TaskMessage> {
        let messages: Vec<TaskMessage> = self.rx.try_iter().collect();
        self.reap_finished();
        messages
    }

    /// Number of workers that have not returned yet.
    pub fn in_flight(&self) -> usize {
        self.workers.iter().filter(|h| !h.is_finished()).count()
    }

    /// Waits up to `grace` for running workers, joins the ones that finished
    /// and detaches the rest.
    pub fn shutdown(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        while self.in_flight() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        let pending = self.in_flight();
        if pending > 0 {
            log::warn!("exiting with {} background task(s) still running", pending);
        }
        self.reap_finished();
        self.workers.clear();
    }

    fn reap_finished(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) =
            self.workers.drain(..).partition(|h| h.is_finished());
        for handle in done {
            if handle.join().is_err() {
                log::error!("a background task panicked");
            }
        }
        self.workers = running;
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.shutdown(EXIT_GRACE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for(runner: &mut TaskRunner, count: usize) -> Vec<TaskMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = Vec::new();
        while got.len() < count && Instant::now() < deadline {
            got.extend(runner.poll());
            thread::sleep(Duration::from_millis(5));
        }
        got
    }

    #[test]
    fn test_success_is_delivered_once() {
        let mut runner = TaskRunner::new(None);
        let id = runner.spawn(TaskKind::Delete, "web", || Ok(TaskSuccess::Deleted));

        let messages = wait_for(&mut runner, 1);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, id);
        assert_eq!(messages[0].kind, TaskKind::Delete);
        assert_eq!(messages[0].env_name, "web");
        assert!(matches!(messages[0].result, Ok(TaskSuccess::Deleted)));

        thread::sleep(Duration::from_millis(20));
        assert!(runner.poll().is_empty());
    }

    #[test]
    fn test_failure_carries_error_payload() {
        let mut runner = TaskRunner::new(None);
        runner.spawn(TaskKind::Create, "dup", || {
            Err(VenvError::AlreadyExists("dup".to_string()))
        });

        let messages = wait_for(&mut runner, 1);
        match &messages[0].result {
            Err(VenvError::AlreadyExists(name)) => assert_eq!(name, "dup"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_independent_tasks_get_distinct_ids() {
        let mut runner = TaskRunner::new(None);
        let a = runner.spawn(TaskKind::Delete, "a", || Ok(TaskSuccess::Deleted));
        let b = runner.spawn(TaskKind::Delete, "b", || Ok(TaskSuccess::Deleted));
        assert_ne!(a, b);

        let mut ids: Vec<u64> = wait_for(&mut runner, 2).iter().map(|m| m.id).collect();
        ids.sort();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_shutdown_does_not_wait_past_grace() {
        let mut runner = TaskRunner::new(None);
        runner.spawn(TaskKind::Activate, "slow", || {
            thread::sleep(Duration::from_millis(500));
            Ok(TaskSuccess::Activated { main_file: None })
        });

        let started = Instant::now();
        runner.shutdown(Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(runner.in_flight(), 0);
    }
}
