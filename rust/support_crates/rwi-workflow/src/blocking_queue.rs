//! An unbounded, blocking, multi-producer single-consumer queue.
//!
//! Every `send` succeeds immediately while the [`Receiver`] is alive; the buffer
//! has no capacity limit, so producers never block and never drop data. `recv`
//! blocks until an item arrives or every [`Sender`] (including clones) is gone.
//!
//! Dropping the [`Receiver`] closes the queue: the buffered items are discarded
//! and every subsequent `send` hands its item back as an error. Producers use this
//! to notice that nobody is listening any more.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Creates a new queue, returning the sender/receiver halves.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::new(),
            producers: 1,
            receiver_alive: true,
        }),
        not_empty: Condvar::new(),
    });
    (Sender(shared.clone()), Receiver(shared))
}

/// The item could not be sent because the receiver has been dropped.
/// Contains the rejected item.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SendError<T>(pub T);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sending on a closed queue")
    }
}

impl<T: std::fmt::Debug> std::error::Error for SendError<T> {}

/// The queue is empty and all senders have been dropped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RecvError;

impl std::fmt::Display for RecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "queue is empty and disconnected")
    }
}

impl std::error::Error for RecvError {}

/// An error returned from [`Receiver::try_recv`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
    /// The queue is empty but senders are still connected.
    Empty,
    /// The queue is empty and all senders have been dropped.
    Disconnected,
}

impl std::fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "queue is empty"),
            TryRecvError::Disconnected => write!(f, "queue is empty and disconnected"),
        }
    }
}

impl std::error::Error for TryRecvError {}

/// The sending half of a [`channel`]. Cloning registers an additional producer.
pub struct Sender<T>(Arc<Shared<T>>);

impl<T> Sender<T> {
    /// Appends `item` to the queue and wakes the receiver.
    ///
    /// Fails, returning the item, only when the receiver has been dropped.
    pub fn send(&self, item: T) -> Result<(), SendError<T>> {
        let mut state = self.0.lock();
        if !state.receiver_alive {
            return Err(SendError(item));
        }
        state.queue.push_back(item);
        drop(state);
        self.0.not_empty.notify_one();
        Ok(())
    }

    /// Returns `true` if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        !self.0.lock().receiver_alive
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        let mut state = self.0.lock();
        assert!(
            state.producers != 0,
            "Attempt to add producer when the queue is half-closed"
        );
        state.producers += 1;
        drop(state);
        Sender(self.0.clone())
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        assert!(state.producers >= 1, "producer count underflow");
        state.producers -= 1;
        if state.producers == 0 {
            drop(state);
            // Wake the receiver so it can observe the disconnected state.
            self.0.not_empty.notify_all();
        }
    }
}

/// The receiving half of a [`channel`].
pub struct Receiver<T>(Arc<Shared<T>>);

impl<T> Receiver<T> {
    /// Blocks until an item is available, or returns [`RecvError`] once the queue
    /// is empty and every sender has been dropped.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut state = self.0.lock();
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Ok(item);
            }
            if state.producers == 0 {
                return Err(RecvError);
            }
            state = self
                .0
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.0.lock();
        if let Some(item) = state.queue.pop_front() {
            return Ok(item);
        }
        if state.producers == 0 {
            Err(TryRecvError::Disconnected)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.0.lock().queue.len()
    }

    /// Returns `true` if no items are currently buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.receiver_alive = false;
        state.queue.clear();
    }
}

impl<T> Iterator for Receiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv().ok()
    }
}

struct State<T> {
    queue: VecDeque<T>,
    producers: usize,
    receiver_alive: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> Shared<T> {
    /// A panic while holding the lock cannot leave `State` half-updated (every
    /// mutation is a single push/pop/counter step), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
