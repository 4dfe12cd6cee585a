//! Threading primitives for the posting materialization pipeline.
//!
//! # Key Components
//!
//! - [`blocking_queue`] - Unbounded blocking channel with producer counting. A receiver
//!   observes disconnection only after the last sender is gone and the buffer is drained.
//! - [`countdown`] - One-shot countdown latch. Exactly one arrival (the last one) is told
//!   that it closed the latch.
//! - [`cancel`] - Cooperative cancellation flag shared between a stream consumer and the
//!   threads feeding it.

pub mod blocking_queue;
pub mod cancel;
pub mod countdown;
