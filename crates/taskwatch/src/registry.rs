//! Task registry.
//!
//! A [`TaskTable`] is the fixed, ordered list of supervised tasks. Tasks are
//! addressed by a dense [`TaskId`] equal to their position in the table.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{WdtError, WdtResult};

/// Dense index of a task in its [`TaskTable`].
///
/// A `TaskId` is not tied to a particular table; every monitor entry point
/// checks it against the registered task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(usize);

impl TaskId {
    /// Create a task id from a table index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Table index of this task.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

fn default_enabled() -> bool {
    true
}

/// Static configuration of one supervised task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Human-readable name, unique within a table.
    pub name: String,
    /// Longest tolerated gap between two reports.
    pub timeout_ms: u32,
    /// Whether the task is supervised right after `init`.
    #[serde(default = "default_enabled")]
    pub default_enabled: bool,
}

impl TaskConfig {
    /// Create an enabled task.
    #[must_use]
    pub fn new(name: impl Into<String>, timeout_ms: u32) -> Self {
        Self {
            name: name.into(),
            timeout_ms,
            default_enabled: true,
        }
    }

    /// Set whether the task starts out supervised.
    #[must_use]
    pub fn default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }
}

/// Ordered table of supervised tasks.
///
/// # Example
///
/// ```rust
/// use taskwatch::{TaskConfig, TaskTable};
///
/// let table = TaskTable::from_json(
///     r#"[{"name": "control", "timeout_ms": 100},
///         {"name": "logger", "timeout_ms": 5000, "default_enabled": false}]"#,
/// )
/// .expect("valid table");
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.find("logger").map(|id| id.index()), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTable {
    tasks: Vec<TaskConfig>,
}

impl TaskTable {
    /// Create a table from task configurations, in id order.
    #[must_use]
    pub fn new(tasks: Vec<TaskConfig>) -> Self {
        Self { tasks }
    }

    /// Parse a table from a JSON array of task objects.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the document does not parse.
    pub fn from_json(json: &str) -> WdtResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| WdtError::invalid_configuration(format!("task table: {e}")))
    }

    /// Serialize the table as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if serialization fails.
    pub fn to_json(&self) -> WdtResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WdtError::invalid_configuration(format!("task table: {e}")))
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Configuration of a task, if registered.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&TaskConfig> {
        self.tasks.get(id.index())
    }

    /// Configuration of a task.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `id` is not registered.
    pub fn config(&self, id: TaskId) -> WdtResult<&TaskConfig> {
        self.get(id)
            .ok_or_else(|| WdtError::out_of_range(id.index(), self.len()))
    }

    /// Look up a task by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .position(|task| task.name == name)
            .map(TaskId::new)
    }

    /// Iterate over `(id, config)` pairs in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (TaskId, &TaskConfig)> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (TaskId::new(index), task))
    }
}

impl FromIterator<TaskConfig> for TaskTable {
    fn from_iter<I: IntoIterator<Item = TaskConfig>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Runtime state of one task.
#[derive(Debug)]
pub(crate) struct TaskState {
    enabled: AtomicBool,
    last_report_ms: AtomicU32,
}

impl TaskState {
    pub(crate) fn new(enabled: bool, now_ms: u32) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            last_report_ms: AtomicU32::new(now_ms),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Store the flag after the timestamp so a poll never pairs a freshly
    /// enabled task with a stale deadline.
    pub(crate) fn set_enabled(&self, enabled: bool, now_ms: u32) {
        self.last_report_ms.store(now_ms, Ordering::Release);
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn last_report_ms(&self) -> u32 {
        self.last_report_ms.load(Ordering::Acquire)
    }

    /// Record a report and return the previous timestamp.
    pub(crate) fn touch(&self, now_ms: u32) -> u32 {
        self.last_report_ms.swap(now_ms, Ordering::AcqRel)
    }

    pub(crate) fn rearm(&self, now_ms: u32) {
        self.last_report_ms.store(now_ms, Ordering::Release);
    }
}
