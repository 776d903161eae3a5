use std::{
    cell::RefCell,
    collections::VecDeque,
    future::poll_fn,
    mem::{replace, take},
    rc::{Rc, Weak},
    task::{Poll, Waker},
    thread::AccessError,
};

use derive_ex::{derive_ex, Ex};
use parse_display::Display;
use serde::{Deserialize, Serialize};

mod bindings;

pub use bindings::*;


thread_local! {
    static GLOBALS: RefCell<Globals> = RefCell::new(Globals::new());
}

struct Globals {
    is_runtime_exists: bool,
    next_id: u64,
    tasks: VecDeque<Task>,
    waker: Option<Waker>,
}
impl Globals {
    fn new() -> Self {
        Self {
            is_runtime_exists: false,
            next_id: 0,
            tasks: VecDeque::new(),
            waker: None,
        }
    }
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        GLOBALS.with(|g| f(&mut g.borrow_mut()))
    }
    fn try_with<T>(f: impl FnOnce(&mut Self) -> T) -> Result<T, AccessError> {
        GLOBALS.try_with(|g| f(&mut g.borrow_mut()))
    }
    fn push_task(task: Task) {
        let waker = Self::try_with(|g| {
            g.tasks.push_back(task);
            g.waker.take()
        });
        if let Ok(Some(waker)) = waker {
            waker.wake();
        }
    }
    fn take_tasks() -> VecDeque<Task> {
        Self::with(|g| take(&mut g.tasks))
    }
    fn requeue_front(mut tasks: VecDeque<Task>) {
        let _ = Self::try_with(|g| {
            tasks.append(&mut g.tasks);
            g.tasks = tasks;
        });
    }
    fn finish_runtime(&mut self) {
        self.is_runtime_exists = false;
        self.waker = None;
    }
}

/// Identity of a node in the dependency graph.
///
/// Ids are unique per thread and never reused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Display)]
#[display("#{0}")]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new() -> Self {
        Globals::with(|g| {
            g.next_id += 1;
            NodeId(g.next_id)
        })
    }
}

/// Kind of a node in the dependency graph.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display)]
#[display(style = "snake_case")]
pub enum NodeKind {
    State,
    Computed,
    Sink,
}

pub const DEFAULT_TURN_LIMIT: usize = 1024;

/// Settings for [`Runtime`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ex, Serialize, Deserialize)]
#[derive_ex(Default)]
#[default(Self::new())]
#[serde(default)]
pub struct RuntimeOptions {
    /// Maximum number of turns performed by a single [`Runtime::update`] call.
    ///
    /// `None` means no limit.
    pub turn_limit: Option<usize>,
}
impl RuntimeOptions {
    pub const fn new() -> Self {
        Self {
            turn_limit: Some(DEFAULT_TURN_LIMIT),
        }
    }
    pub const fn with_turn_limit(mut self, turn_limit: Option<usize>) -> Self {
        self.turn_limit = turn_limit;
        self
    }
}

#[non_exhaustive]
#[derive(Display, Debug)]
#[display("`Runtime` already exists in this thread.")]
pub struct RuntimeExistsError {}

impl std::error::Error for RuntimeExistsError {}

/// Cooperative task queue runner.
///
/// Sinks schedule their flushes on a thread-local queue.
/// The queued flushes run only when the `Runtime` of the same thread is asked to run them,
/// so a flush never runs in the middle of the mutation that caused it.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    options: RuntimeOptions,
}
impl Runtime {
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::new())
    }
    pub fn with_options(options: RuntimeOptions) -> Self {
        match Self::try_with_options(options) {
            Ok(rt) => rt,
            Err(e) => panic!("{e}"),
        }
    }
    pub fn try_new() -> Result<Self, RuntimeExistsError> {
        Self::try_with_options(RuntimeOptions::new())
    }
    pub fn try_with_options(options: RuntimeOptions) -> Result<Self, RuntimeExistsError> {
        if Globals::with(|g| replace(&mut g.is_runtime_exists, true)) {
            return Err(RuntimeExistsError {});
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Perform one turn: run the tasks scheduled before this call, in scheduling order.
    ///
    /// Tasks scheduled while the turn is running are left for the next turn.
    ///
    /// Returns `true` if any task was performed.
    ///
    /// If a task panics, the tasks of this turn that have not run yet are put back
    /// at the front of the queue.
    pub fn run_tasks(&mut self) -> bool {
        let mut turn = Turn(Globals::take_tasks());
        if turn.0.is_empty() {
            return false;
        }
        tracing::trace!(count = turn.0.len(), "run tasks");
        while let Some(task) = turn.0.pop_front() {
            task.run();
        }
        true
    }

    /// Repeat [`run_tasks`](Self::run_tasks) until there are no more tasks
    /// or [`RuntimeOptions::turn_limit`] turns have been performed.
    ///
    /// With a limit of `Some(0)`, no task is performed.
    pub fn update(&mut self) {
        let mut turns = 0;
        loop {
            if let Some(limit) = self.options.turn_limit {
                if turns >= limit {
                    if !self.is_idle() {
                        tracing::warn!(
                            limit,
                            pending = self.pending_tasks(),
                            "turn limit reached, remaining tasks are left in the queue"
                        );
                    }
                    break;
                }
            }
            if !self.run_tasks() {
                break;
            }
            turns += 1;
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0
    }
    pub fn pending_tasks(&self) -> usize {
        Globals::with(|g| g.tasks.len())
    }

    /// Wait while there is no task to be performed by [`update`](Self::update).
    pub async fn wait_for_ready(&mut self) {
        poll_fn(|cx| {
            Globals::with(|g| {
                if g.tasks.is_empty() {
                    g.waker = Some(cx.waker().clone());
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
        })
        .await
    }
}
impl Drop for Runtime {
    fn drop(&mut self) {
        let _ = Globals::try_with(|g| g.finish_runtime());
    }
}

struct Turn(VecDeque<Task>);

impl Drop for Turn {
    fn drop(&mut self) {
        if !self.0.is_empty() {
            Globals::requeue_front(take(&mut self.0));
        }
    }
}

/// A deferred unit of work on the thread-local task queue.
pub struct Task(Box<dyn FnOnce()>);

impl Task {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Task(Box::new(f))
    }

    /// Create a task that calls `f` only if `this` is still alive when the task runs.
    pub fn from_weak_fn<T: ?Sized + 'static>(
        this: Weak<T>,
        f: impl FnOnce(Rc<T>) + 'static,
    ) -> Self {
        Task::new(move || {
            if let Some(this) = this.upgrade() {
                f(this)
            }
        })
    }

    /// Append this task to the queue of the current thread.
    ///
    /// The task runs on the next [`Runtime::run_tasks`] call.
    pub fn schedule(self) {
        Globals::push_task(self)
    }
    fn run(self) {
        (self.0)()
    }
}
