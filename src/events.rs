//! Invocation lifecycle events.
//!
//! The invoker emits one event per state transition via [`EventBus::emit`];
//! observers subscribe via [`EventBus::subscribe`]. Built on
//! [`tokio::sync::broadcast`] so multiple listeners can react independently.
//!
//! Every invocation goes `Spawning`, then either straight to
//! `Finished(SpawnFailed)` or through `Running` and `Exited` to exactly one
//! other terminal state.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::broadcast;

/// Final state of an invocation. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    SpawnFailed,
    ExecutionFailed,
    ParseFailed,
    ApplicationFailed,
    Succeeded,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Terminal::SpawnFailed => "spawn failed",
            Terminal::ExecutionFailed => "execution failed",
            Terminal::ParseFailed => "parse failed",
            Terminal::ApplicationFailed => "application failed",
            Terminal::Succeeded => "succeeded",
        };
        f.write_str(label)
    }
}

/// A lifecycle transition of one invocation, keyed by invocation id.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Spawning { id: u64, path: PathBuf },
    Running { id: u64, pid: Option<u32> },
    Exited { id: u64, code: Option<i32> },
    Finished { id: u64, terminal: Terminal },
}

impl Event {
    pub fn id(&self) -> u64 {
        match self {
            Event::Spawning { id, .. }
            | Event::Running { id, .. }
            | Event::Exited { id, .. }
            | Event::Finished { id, .. } => *id,
        }
    }
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Does not replay past ones.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
