//! Fixed set of worker threads draining three strict priority queues.
//!
//! Workers always take from High, then Standard, then Low. Within a tier
//! tasks run in submission order. A running task is never preempted.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskPriority {
    Low,
    Standard,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Standard => "standard",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// Unit of work executed by a [`WorkerPool`].
pub trait Job: Send + 'static {
    /// State shared by every job run on the pool.
    type Context: Send + Sync + 'static;
    type Error: fmt::Display;

    fn priority(&self) -> TaskPriority;

    fn kind(&self) -> &'static str;

    /// Short human readable context for logs.
    fn describe(&self) -> String;

    fn process(self, ctx: &Self::Context) -> Result<(), Self::Error>;
}

struct Queues<J> {
    high: VecDeque<J>,
    standard: VecDeque<J>,
    low: VecDeque<J>,
    stopping: bool,
}

impl<J> Queues<J> {
    fn tier(&mut self, priority: TaskPriority) -> &mut VecDeque<J> {
        match priority {
            TaskPriority::High => &mut self.high,
            TaskPriority::Standard => &mut self.standard,
            TaskPriority::Low => &mut self.low,
        }
    }

    fn pop(&mut self) -> Option<J> {
        self.high
            .pop_front()
            .or_else(|| self.standard.pop_front())
            .or_else(|| self.low.pop_front())
    }

    fn clear(&mut self) -> usize {
        let dropped = self.high.len() + self.standard.len() + self.low.len();
        self.high.clear();
        self.standard.clear();
        self.low.clear();
        dropped
    }
}

struct Shared<J> {
    queues: Mutex<Queues<J>>,
    available: Condvar,
}

impl<J> Shared<J> {
    fn lock(&self) -> MutexGuard<'_, Queues<J>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle used to enqueue work. Created before the pool so it can
/// be handed to the jobs' context.
pub struct TaskSubmitter<J> {
    shared: Arc<Shared<J>>,
}

impl<J> Clone for TaskSubmitter<J> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<J> fmt::Debug for TaskSubmitter<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSubmitter").finish_non_exhaustive()
    }
}

impl<J: Job> Default for TaskSubmitter<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Job> TaskSubmitter<J> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queues: Mutex::new(Queues {
                    high: VecDeque::new(),
                    standard: VecDeque::new(),
                    low: VecDeque::new(),
                    stopping: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// Queue a job on the tier of its priority. Never blocks on running work.
    pub fn submit(&self, job: J) {
        let priority = job.priority();
        let mut queues = self.shared.lock();

        if queues.stopping {
            debug!(task = job.kind(), %priority, "⚙️ Pool is shutting down, task dropped");
            return;
        }

        queues.tier(priority).push_back(job);
        drop(queues);
        self.shared.available.notify_one();
    }

    /// Number of queued, not yet started, jobs in a tier.
    pub fn len(&self, priority: TaskPriority) -> usize {
        self.shared.lock().tier(priority).len()
    }

    pub fn is_empty(&self) -> bool {
        let queues = self.shared.lock();
        queues.high.is_empty() && queues.standard.is_empty() && queues.low.is_empty()
    }
}

pub struct WorkerPool<J: Job> {
    shared: Arc<Shared<J>>,
    workers: Vec<JoinHandle<()>>,
}

impl<J: Job> WorkerPool<J> {
    /// Spawn `threads` workers (at least one) pulling from the submitter's queues.
    pub fn start(
        submitter: &TaskSubmitter<J>,
        threads: usize,
        ctx: Arc<J::Context>,
    ) -> io::Result<Self> {
        let threads = threads.max(1);
        let mut pool = Self {
            shared: submitter.shared.clone(),
            workers: Vec::with_capacity(threads),
        };

        for index in 0..threads {
            let shared = pool.shared.clone();
            let ctx = ctx.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{index}"))
                .spawn(move || run_worker(&shared, ctx.as_ref()))?;
            pool.workers.push(handle);
        }

        info!(threads, "⚙️ Worker pool started");
        Ok(pool)
    }

    /// Stop accepting work, wake idle workers and wait for running tasks to finish.
    /// Jobs still queued are dropped.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        let dropped = {
            let mut queues = self.shared.lock();
            queues.stopping = true;
            queues.clear()
        };
        self.shared.available.notify_all();
        info!(dropped, "⚙️ Worker pool shutting down");

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("⚙️ ❌ A worker thread exited abnormally");
            }
        }
        info!("⚙️ Worker pool stopped");
    }
}

impl<J: Job> Drop for WorkerPool<J> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<J: Job>(shared: &Shared<J>, ctx: &J::Context) {
    loop {
        let job = {
            let mut queues = shared.lock();
            loop {
                if queues.stopping {
                    return;
                }
                if let Some(job) = queues.pop() {
                    break job;
                }
                queues = shared
                    .available
                    .wait(queues)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        execute(job, ctx);
    }
}

fn execute<J: Job>(job: J, ctx: &J::Context) {
    let kind = job.kind();
    let priority = job.priority();
    let description = job.describe();
    debug!(task = kind, %priority, %description, "⚙️ Task started");

    match panic::catch_unwind(AssertUnwindSafe(|| job.process(ctx))) {
        Ok(Ok(())) => debug!(task = kind, %priority, "⚙️ ✅ Task completed"),
        Ok(Err(e)) => error!(task = kind, %priority, %description, "⚙️ ❌ Task failed: {e}"),
        Err(payload) => error!(
            task = kind,
            %priority,
            %description,
            "⚙️ 💥 Task panicked: {}",
            panic_message(payload.as_ref())
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::{Duration, Instant};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    enum TestJob {
        Block {
            started: Sender<()>,
            release: Receiver<()>,
        },
        Record(TaskPriority, String),
        Fail,
        Panic,
    }

    impl Job for TestJob {
        type Context = Recorder;
        type Error = String;

        fn priority(&self) -> TaskPriority {
            match self {
                Self::Record(priority, _) => *priority,
                _ => TaskPriority::Standard,
            }
        }

        fn kind(&self) -> &'static str {
            "test"
        }

        fn describe(&self) -> String {
            match self {
                Self::Record(_, name) => name.clone(),
                _ => String::new(),
            }
        }

        fn process(self, ctx: &Recorder) -> Result<(), String> {
            match self {
                Self::Block { started, release } => {
                    started.send(()).unwrap();
                    release.recv().unwrap();
                    Ok(())
                }
                Self::Record(_, name) => {
                    ctx.log.lock().unwrap().push(name);
                    Ok(())
                }
                Self::Fail => Err("boom".to_string()),
                Self::Panic => panic!("task blew up"),
            }
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn block_single_worker(submitter: &TaskSubmitter<TestJob>) -> Sender<()> {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        submitter.submit(TestJob::Block {
            started: started_tx,
            release: release_rx,
        });
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx
    }

    #[test]
    fn high_priority_overtakes_queued_low_tasks() {
        let submitter = TaskSubmitter::new();
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::start(&submitter, 1, recorder.clone()).unwrap();

        let release = block_single_worker(&submitter);
        for i in 0..100 {
            submitter.submit(TestJob::Record(TaskPriority::Low, format!("low-{i}")));
        }
        submitter.submit(TestJob::Record(TaskPriority::Standard, "standard".into()));
        submitter.submit(TestJob::Record(TaskPriority::High, "high".into()));
        assert_eq!(submitter.len(TaskPriority::Low), 100);

        release.send(()).unwrap();
        wait_until(|| recorder.entries().len() == 102);

        let entries = recorder.entries();
        assert_eq!(entries[0], "high");
        assert_eq!(entries[1], "standard");
        assert_eq!(entries[2], "low-0");
        assert_eq!(entries[101], "low-99");
        pool.shutdown();
    }

    #[test]
    fn failing_and_panicking_tasks_do_not_stop_the_worker() {
        let submitter = TaskSubmitter::new();
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::start(&submitter, 1, recorder.clone()).unwrap();

        submitter.submit(TestJob::Fail);
        submitter.submit(TestJob::Panic);
        submitter.submit(TestJob::Record(TaskPriority::Standard, "after".into()));

        wait_until(|| recorder.entries() == vec!["after".to_string()]);
        pool.shutdown();
    }

    #[test]
    fn shutdown_drops_queued_tasks_and_later_submissions() {
        let submitter = TaskSubmitter::new();
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::start(&submitter, 1, recorder.clone()).unwrap();

        let release = block_single_worker(&submitter);
        submitter.submit(TestJob::Record(TaskPriority::Low, "queued".into()));

        let stopper = thread::spawn(move || pool.shutdown());
        wait_until(|| submitter.is_empty());
        release.send(()).unwrap();
        stopper.join().unwrap();

        submitter.submit(TestJob::Record(TaskPriority::High, "late".into()));
        assert!(submitter.is_empty());
        assert!(recorder.entries().is_empty());
    }

    #[test]
    fn idle_workers_shut_down_promptly() {
        let submitter: TaskSubmitter<TestJob> = TaskSubmitter::new();
        let pool = WorkerPool::start(&submitter, 4, Arc::new(Recorder::default())).unwrap();
        let start = Instant::now();

        pool.shutdown();

        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
