//! # Task Management
//!
//! Runs chunk work (generation, meshing, occlusion) on a fixed set of worker threads
//! and hands the results back to whoever owns the [`EngineState`].
//!
//! ## Pieces
//! - `TaskManager`: Owns the workers, the queue and the set of in-flight keys
//! - `Task`: Work that runs on a worker against that worker's scratch buffers
//! - `TaskResult`: Applied to the engine state on the polling thread; may return follow-ups
//! - `TaskChannel`: The sender and receiver pair linking the host to one worker
//!
//! ## Threads
//! Native builds spawn `std::thread` workers. Web builds go through `wasm_thread`,
//! which backs each worker with a web worker. Each worker owns its [`WorkerScratch`]
//! for its whole life, so buffers are never shared between threads.
//!
//! With zero workers, or once every worker has died, queued tasks run inline on the
//! calling thread during [`TaskManager::process_completed_tasks`].
//!
//! ## Keys and Collisions
//! Every task carries a [`TaskKey`] (subsystem plus chunk). A key stays in flight from
//! the moment the task is published until its result has been handled, and a second
//! task under the same key is refused with [`VoxelError::AlreadyInFlight`]: two tasks
//! for one chunk would otherwise race on the same output. Follow-up tasks returned by
//! results that collide this way are deferred and retried on later polls instead.
//!
//! ## Lifecycle
//! A published task goes to the next idle worker in round-robin order, or waits in
//! the queue. The worker sends back the result tagged with the task's key. The host
//! polls `process_completed_tasks()`, which applies each result, releases its key and
//! publishes whatever follow-up tasks the result produced.
//!
//! ## Example
//! ```
//! use voxel_engine::engine_state::task_management::TaskManager;
//!
//! let mut task_manager = TaskManager::new(2);
//! assert_eq!(task_manager.worker_count(), 2);
//! assert!(task_manager.is_idle());
//! ```

pub mod task;

use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use log::{debug, error, info};
use task::{Task, TaskKey, TaskResult, WorkerScratch};

use crate::core::error::{Result, VoxelError};

use super::EngineState;

#[cfg(target_family = "wasm")]
mod wasm_imports {
    pub use wasm_thread as thread;
    pub use wasm_thread::JoinHandle;
}

#[cfg(target_family = "wasm")]
use self::wasm_imports::*;

#[cfg(not(target_family = "wasm"))]
use std::thread::{self, JoinHandle};

/// A boxed task result tagged with the key of the task that produced it.
type KeyedResult = (TaskKey, Box<dyn TaskResult + Send>);

/// The host's end of one worker thread.
///
/// `running` holds the keys sent to the worker and not yet answered, oldest first.
/// `disconnected` is set once the worker has gone away, which happens when a task panics.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<KeyedResult>,
    running: VecDeque<TaskKey>,
    disconnected: bool,
    _worker: JoinHandle<()>,
}

impl TaskChannel {
    fn is_available(&self) -> bool {
        !self.disconnected && self.running.len() < MAX_TASKS_IN_FLIGHT
    }
}

/// Worker pool with per-key exclusion.
///
/// A key is in flight from [`TaskManager::publish_task`] until its result has been
/// handled, whether the task is queued, running or finished and waiting to be polled.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    /// Waiting for an idle worker
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    /// Follow-ups that collided with an in-flight key
    deferred_tasks: VecDeque<Box<dyn Task + Send>>,
    in_flight: HashSet<TaskKey>,
    /// Next channel to try
    current_channel: usize,
    inline_scratch: WorkerScratch,
    inline_results: VecDeque<KeyedResult>,
}

/// Tasks a single worker may hold at once.
///
/// Kept at 1 so a busy worker never sits on work an idle one could take.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Spawns `num_workers` workers, each with its own scratch buffers.
    ///
    /// With zero workers every task runs inline on the polling thread.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for worker_idx in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<KeyedResult>();

            let task_closure = move || {
                let mut scratch = WorkerScratch::default();
                while let Ok(task) = task_rx.recv() {
                    let key = task.key();
                    let result = task.process(&mut scratch);
                    if result_tx.send((key, result)).is_err() {
                        break;
                    }
                }
                debug!("Worker {} shutting down", worker_idx);
            };

            let worker = thread::spawn(task_closure);

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                running: VecDeque::new(),
                disconnected: false,
                _worker: worker,
            });
        }

        info!(
            "Started {} task workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            deferred_tasks: VecDeque::new(),
            in_flight: HashSet::new(),
            current_channel: 0,
            inline_scratch: WorkerScratch::default(),
            inline_results: VecDeque::new(),
        }
    }

    /// Number of worker threads still alive.
    pub fn worker_count(&self) -> usize {
        self.channels.iter().filter(|c| !c.disconnected).count()
    }

    /// Returns `true` if a task under `key` has been published and its result not yet handled.
    pub fn is_in_flight(&self, key: TaskKey) -> bool {
        self.in_flight.contains(&key)
    }

    /// Number of tasks published or deferred whose results have not been handled.
    pub fn pending_count(&self) -> usize {
        self.in_flight.len() + self.deferred_tasks.len()
    }

    /// Returns `true` when no task is queued, running, deferred or awaiting handling.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.deferred_tasks.is_empty()
    }

    /// Sends `task` to worker `channel_idx`.
    ///
    /// On failure the worker is gone: its channel is marked disconnected and the task
    /// is handed back so the caller can requeue it.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> std::result::Result<(), Box<dyn Task + Send>> {
        let key = task.key();
        let channel = &mut self.channels[channel_idx];
        match channel.task_sender.send(task) {
            Ok(_) => {
                channel.running.push_back(key);
                Ok(())
            }
            Err(task) => {
                error!("Worker {} is gone, requeueing {}", channel_idx, key);
                channel.disconnected = true;
                Err(task.0)
            }
        }
    }

    /// First idle, live channel at or after `current_channel`, wrapping around.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].is_available())
    }

    /// Hands `task` to an idle worker, or queues it.
    ///
    /// # Returns
    /// `Ok(true)` if a worker took the task right away, `Ok(false)` if it was queued.
    ///
    /// # Errors
    /// [`VoxelError::AlreadyInFlight`] if a task with the same key is queued or
    /// running. The caller is expected to retry later.
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> Result<bool> {
        let key = task.key();
        if !self.in_flight.insert(key) {
            return Err(VoxelError::AlreadyInFlight(key));
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    Ok(true)
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    Ok(false)
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                Ok(false)
            }
        }
    }

    /// Publishes `task`, deferring it if its key is already in flight.
    fn publish_or_defer(&mut self, task: Box<dyn Task + Send>) {
        let key = task.key();
        if self.in_flight.contains(&key) {
            debug!("{} collided with a running task, deferring", key);
            self.deferred_tasks.push_back(task);
            return;
        }
        if let Err(e) = self.publish_task(task) {
            error!("Failed to publish {}: {}", key, e);
        }
    }

    /// Moves queued tasks, oldest first, onto idle workers until none is idle.
    ///
    /// When no live worker remains the whole queue runs inline instead.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            if self.worker_count() == 0 {
                self.run_queued_inline();
                return;
            }

            let Some(channel_idx) = self.find_available_channel() else {
                return;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => self.queued_tasks.push_front(task),
            }
        }
    }

    fn run_queued_inline(&mut self) {
        while let Some(task) = self.queued_tasks.pop_front() {
            let key = task.key();
            let result = task.process(&mut self.inline_scratch);
            self.inline_results.push_back((key, result));
        }
    }

    /// Applies every finished result to `state`.
    ///
    /// Each handled result releases its key and publishes the follow-ups it returned.
    /// Deferred tasks whose keys have been released are retried first.
    pub fn process_completed_tasks(&mut self, state: &mut EngineState) {
        self.process_queued_tasks();

        let mut completed: Vec<KeyedResult> = self.inline_results.drain(..).collect();
        for (channel_idx, channel) in self.channels.iter_mut().enumerate() {
            if channel.disconnected && channel.running.is_empty() {
                continue;
            }
            loop {
                match channel.result_receiver.try_recv() {
                    Ok((key, result)) => {
                        if let Some(position) = channel.running.iter().position(|k| *k == key) {
                            channel.running.remove(position);
                        }
                        completed.push((key, result));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        channel.disconnected = true;
                        for key in channel.running.drain(..) {
                            error!("Worker {} died while running {}", channel_idx, key);
                            self.in_flight.remove(&key);
                        }
                        break;
                    }
                }
            }
        }

        let mut follow_ups = Vec::new();
        for (key, result) in completed {
            self.in_flight.remove(&key);
            follow_ups.extend(result.handle_result(state));
        }

        let deferred: Vec<_> = self.deferred_tasks.drain(..).collect();
        for task in deferred.into_iter().chain(follow_ups) {
            self.publish_or_defer(task);
        }

        self.process_queued_tasks();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        if !self.channels.is_empty() {
            info!("Stopping {} task workers", self.channels.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::task::Subsystem;
    use super::*;
    use crate::core::EngineConfig;
    use crate::engine_state::voxels::chunk::{generators::Empty, ChunkKey};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingTask {
        key: TaskKey,
        counter: Arc<AtomicUsize>,
        follow_up: Option<ChunkKey>,
    }

    impl Task for CountingTask {
        fn key(&self) -> TaskKey {
            self.key
        }

        fn process(&self, _scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult {
                counter: self.counter.clone(),
                follow_up: self.follow_up,
            })
        }
    }

    struct CountingResult {
        counter: Arc<AtomicUsize>,
        follow_up: Option<ChunkKey>,
    }

    impl TaskResult for CountingResult {
        fn handle_result(self: Box<Self>, _state: &mut EngineState) -> Vec<Box<dyn Task + Send>> {
            self.follow_up
                .map(|chunk| {
                    Box::new(CountingTask {
                        key: TaskKey::new(Subsystem::Meshing, chunk),
                        counter: self.counter.clone(),
                        follow_up: None,
                    }) as Box<dyn Task + Send>
                })
                .into_iter()
                .collect()
        }
    }

    struct PanickingTask;

    impl Task for PanickingTask {
        fn key(&self) -> TaskKey {
            TaskKey::new(Subsystem::Generation, ChunkKey::new(9, 9, 9))
        }

        fn process(&self, _scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send> {
            panic!("task failure");
        }
    }

    fn state() -> EngineState {
        EngineState::new(EngineConfig::default(), Arc::new(Empty))
    }

    fn counting(chunk: ChunkKey, counter: &Arc<AtomicUsize>) -> Box<dyn Task + Send> {
        Box::new(CountingTask {
            key: TaskKey::new(Subsystem::Meshing, chunk),
            counter: counter.clone(),
            follow_up: None,
        })
    }

    fn drain(manager: &mut TaskManager, state: &mut EngineState) {
        while !manager.is_idle() {
            manager.process_completed_tasks(state);
            std::thread::yield_now();
        }
    }

    #[test]
    fn runs_tasks_on_workers() {
        let mut manager = TaskManager::new(2);
        let mut state = state();
        let counter = Arc::new(AtomicUsize::new(0));
        for x in 0..10 {
            manager
                .publish_task(counting(ChunkKey::new(x, 0, 0), &counter))
                .unwrap();
        }
        assert_eq!(manager.pending_count(), 10);
        drain(&mut manager, &mut state);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut manager = TaskManager::new(1);
        let mut state = state();
        let counter = Arc::new(AtomicUsize::new(0));
        let chunk = ChunkKey::new(0, 0, 0);
        manager.publish_task(counting(chunk, &counter)).unwrap();
        let err = manager.publish_task(counting(chunk, &counter)).unwrap_err();
        assert!(matches!(err, VoxelError::AlreadyInFlight(key) if key.chunk == chunk));
        assert!(manager.is_in_flight(TaskKey::new(Subsystem::Meshing, chunk)));

        drain(&mut manager, &mut state);
        assert!(!manager.is_in_flight(TaskKey::new(Subsystem::Meshing, chunk)));
        assert!(manager.publish_task(counting(chunk, &counter)).is_ok());
        drain(&mut manager, &mut state);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn colliding_follow_up_is_deferred() {
        let mut manager = TaskManager::new(1);
        let mut state = state();
        let counter = Arc::new(AtomicUsize::new(0));
        let chunk = ChunkKey::new(1, 1, 1);
        // The only worker is busy with the first task, so the second stays queued and
        // the first task's follow-up collides with it.
        manager
            .publish_task(Box::new(CountingTask {
                key: TaskKey::new(Subsystem::Generation, chunk),
                counter: counter.clone(),
                follow_up: Some(ChunkKey::new(2, 2, 2)),
            }))
            .unwrap();
        manager
            .publish_task(counting(ChunkKey::new(2, 2, 2), &counter))
            .unwrap();
        drain(&mut manager, &mut state);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_workers_run_inline() {
        let mut manager = TaskManager::new(0);
        let mut state = state();
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduled = manager
            .publish_task(counting(ChunkKey::new(0, 0, 0), &counter))
            .unwrap();
        assert!(!scheduled);
        manager.process_completed_tasks(&mut state);
        assert!(manager.is_idle());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dead_worker_releases_its_key() {
        let mut manager = TaskManager::new(1);
        let mut state = state();
        manager.publish_task(Box::new(PanickingTask)).unwrap();
        drain(&mut manager, &mut state);
        assert_eq!(manager.worker_count(), 0);

        // Remaining work falls back to running inline.
        let counter = Arc::new(AtomicUsize::new(0));
        manager
            .publish_task(counting(ChunkKey::new(0, 0, 0), &counter))
            .unwrap();
        drain(&mut manager, &mut state);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
