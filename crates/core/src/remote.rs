//! Cross-thread command queue
//!
//! Lets background threads queue work that runs on the thread driving the
//! scheduler. Commands are drained at the start of each tick, before tasks
//! scheduled since the previous tick are activated, so a task scheduled by a
//! command runs in that same tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::timers::Scheduler;

/// Work queued for the scheduler thread
pub type Command = Box<dyn FnOnce(&mut Scheduler) + Send + 'static>;

/// Errors returned when submitting a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Queue is at capacity; the command was dropped
    #[error("Remote command queue is full")]
    Full,

    /// The scheduler was dropped
    #[error("Scheduler is gone")]
    Disconnected,
}

/// Channel pair owned by the scheduler
pub(crate) struct CommandQueue {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl CommandQueue {
    /// Create a queue holding at most `capacity` commands (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Hand out a sender
    pub fn remote(&self) -> SchedulerRemote {
        SchedulerRemote {
            sender: self.sender.clone(),
        }
    }

    /// Next queued command, if any
    pub fn try_next(&self) -> Option<Command> {
        self.receiver.try_recv().ok()
    }
}

/// Cloneable, thread-safe sender of scheduler commands
///
/// # Example
///
/// ```ignore
/// let remote = scheduler.remote();
/// std::thread::spawn(move || {
///     let _ = remote.submit(|scheduler| {
///         let _ = scheduler.schedule_once(1.0, |_| tracing::info!("from a worker"));
///     });
/// });
/// ```
#[derive(Clone)]
pub struct SchedulerRemote {
    sender: Sender<Command>,
}

impl SchedulerRemote {
    /// Queue a command for the next tick
    ///
    /// Never blocks.
    ///
    /// # Returns
    /// - `Ok(())` if the command was queued
    /// - `Err(RemoteError::Full)` if the queue is full (command is dropped)
    /// - `Err(RemoteError::Disconnected)` if the scheduler is gone
    #[tracing::instrument(skip_all)]
    pub fn submit<F>(&self, command: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut Scheduler) + Send + 'static,
    {
        match self.sender.try_send(Box::new(command)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Remote command queue full, dropping command");
                Err(RemoteError::Full)
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Remote command queue disconnected");
                Err(RemoteError::Disconnected)
            }
        }
    }

    /// Queue a command, blocking while the queue is full
    ///
    /// # Warning
    /// Only call from background threads, never from the thread that ticks
    /// the scheduler (it would wait forever on a full queue).
    #[tracing::instrument(skip_all)]
    pub fn submit_blocking<F>(&self, command: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut Scheduler) + Send + 'static,
    {
        self.sender.send(Box::new(command)).map_err(|e| {
            tracing::error!("Failed to queue command (blocking): {}", e);
            RemoteError::Disconnected
        })
    }

    /// Number of commands waiting for the next tick
    pub fn queued(&self) -> usize {
        self.sender.len()
    }
}

impl std::fmt::Debug for SchedulerRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerRemote")
            .field("queued", &self.sender.len())
            .finish()
    }
}
