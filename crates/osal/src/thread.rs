//! Task lifecycle wrapper and task registry.
//!
//! [`Task`] follows the state machine
//! `Uninitialized -> initialize -> Configured -> start -> Running ->
//! join -> Terminated`, with `Suspended` reachable only on backends that
//! support it. A default-constructed wrapper carries no entry function,
//! reports `is_valid() == false`, and every lifecycle operation on it fails
//! closed with [`Error::InvalidState`].
//!
//! [`TaskRegistry`] is an explicit, bounds-checked record of running tasks
//! owned by the application. There is no process-wide table and no raw
//! index arithmetic; unknown ids and exhausted capacity are errors.

use alloc::boxed::Box;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::backend;
use crate::error::Error;

/// Entry function executed by a started task.
pub type TaskFunc = Box<dyn FnOnce() + Send + 'static>;

/// Longest task name retained by the wrapper; longer names are truncated.
pub const MAX_NAME_LEN: usize = 16;

/// Capacity of a [`TaskRegistry`].
pub const MAX_TASKS: usize = 32;

/// Bounded task name storage.
pub type TaskName = heapless::String<MAX_NAME_LEN>;

/// Execution priority, lowest to highest.
///
/// The host backend schedules all tasks at the OS default and ignores this,
/// matching the usual simulation semantics; the rtos port kernel maps the
/// six levels onto its own priority range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Level0,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

impl Priority {
    pub const MINIMUM: Self = Self::Level0;
    pub const MAXIMUM: Self = Self::Level5;
}

/// Stable identifier handed out by [`Task::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(usize);

impl TaskId {
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Uninitialized,
    Configured,
    Running,
    Suspended,
    Terminated,
}

static NEXT_TASK_ID: AtomicUsize = AtomicUsize::new(backend::MAIN_CONTEXT_ID + 1);

fn allocate_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

fn bounded_name(name: &str) -> TaskName {
    let mut out = TaskName::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// A schedulable unit of execution.
pub struct Task {
    entry: Option<TaskFunc>,
    native: Option<backend::NativeThread>,
    id: Option<TaskId>,
    state: TaskState,
    priority: Priority,
    stack_size: usize,
    name: TaskName,
}

impl Task {
    /// An empty wrapper. Falsy until [`initialize`](Self::initialize) runs.
    pub fn new() -> Self {
        Self {
            entry: None,
            native: None,
            id: None,
            state: TaskState::Uninitialized,
            priority: Priority::MINIMUM,
            stack_size: 0,
            name: TaskName::new(),
        }
    }

    /// Configures a not-yet-running task. Does not start execution.
    ///
    /// Reconfiguring a `Configured` or `Terminated` wrapper is allowed;
    /// reconfiguring a live one is not.
    pub fn initialize(
        &mut self,
        entry: impl FnOnce() + Send + 'static,
        priority: Priority,
        stack_size: usize,
        name: &str,
    ) -> Result<(), Error> {
        if matches!(self.state, TaskState::Running | TaskState::Suspended) {
            return Err(Error::InvalidState);
        }
        self.entry = Some(Box::new(entry));
        self.native = None;
        self.id = None;
        self.priority = priority;
        self.stack_size = stack_size;
        self.name = bounded_name(name);
        self.state = TaskState::Configured;
        Ok(())
    }

    /// Transitions a configured task to running and returns its identifier.
    pub fn start(&mut self) -> Result<TaskId, Error> {
        if self.state != TaskState::Configured {
            return Err(Error::InvalidState);
        }
        let entry = self.entry.take().ok_or(Error::InvalidState)?;
        let id = allocate_task_id();
        let native =
            backend::NativeThread::spawn(self.name.as_str(), self.stack_size, id.as_usize(), entry)?;
        log::debug!("task '{}' started as id {}", self.name.as_str(), id);
        self.native = Some(native);
        self.id = Some(id);
        self.state = TaskState::Running;
        Ok(id)
    }

    /// Blocks until the task finishes.
    ///
    /// Only meaningful on backends whose tasks return; rtos tasks
    /// conventionally never do, and there this reports
    /// [`Error::NotSupported`] rather than silently succeeding.
    pub fn join(&mut self) -> Result<(), Error> {
        if !backend::NativeThread::JOINABLE {
            return Err(Error::NotSupported);
        }
        let native = self.native.take().ok_or(Error::InvalidState)?;
        native.join()?;
        self.state = TaskState::Terminated;
        Ok(())
    }

    /// Whether [`join`](Self::join) is valid to call right now.
    pub fn is_joinable(&self) -> bool {
        backend::NativeThread::JOINABLE && self.native.is_some()
    }

    /// Suspends a running task (rtos backend only).
    pub fn suspend(&mut self) -> Result<(), Error> {
        if !backend::NativeThread::SUSPENDABLE {
            return Err(Error::NotSupported);
        }
        if self.state != TaskState::Running {
            return Err(Error::InvalidState);
        }
        self.state = TaskState::Suspended;
        Ok(())
    }

    /// Resumes a suspended task (rtos backend only).
    pub fn resume(&mut self) -> Result<(), Error> {
        if !backend::NativeThread::SUSPENDABLE {
            return Err(Error::NotSupported);
        }
        if self.state != TaskState::Suspended {
            return Err(Error::InvalidState);
        }
        self.state = TaskState::Running;
        Ok(())
    }

    /// Backend-specific handle for advanced interop.
    pub fn native_id(&self) -> Option<backend::NativeTaskId> {
        self.native.as_ref().map(|native| native.id())
    }

    pub fn id(&self) -> Option<TaskId> {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// False for a default-constructed wrapper with no entry function.
    pub fn is_valid(&self) -> bool {
        self.state != TaskState::Uninitialized
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry record for one started task.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: TaskName,
    pub priority: Priority,
}

/// Explicit, bounds-checked record of running tasks.
pub struct TaskRegistry {
    slots: heapless::Vec<TaskRecord, MAX_TASKS>,
}

impl TaskRegistry {
    pub const fn new() -> Self {
        Self {
            slots: heapless::Vec::new(),
        }
    }

    /// Records a started task. Fails closed when the task has no id yet,
    /// when the id is already present, or when the registry is full.
    pub fn register(&mut self, task: &Task) -> Result<(), Error> {
        let id = task.id().ok_or(Error::InvalidState)?;
        if self.get(id).is_some() {
            return Err(Error::InvalidState);
        }
        self.slots
            .push(TaskRecord {
                id,
                name: bounded_name(task.name()),
                priority: task.priority(),
            })
            .map_err(|_| Error::Full)
    }

    pub fn unregister(&mut self, id: TaskId) -> Result<(), Error> {
        let index = self
            .slots
            .iter()
            .position(|record| record.id == id)
            .ok_or(Error::NotFound)?;
        self.slots.swap_remove(index);
        Ok(())
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.slots.iter().find(|record| record.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&TaskRecord> {
        self.slots.iter().find(|record| record.name.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        MAX_TASKS
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
