//! A countdown latch for threads: waiters block until a fixed number of
//! `count_down` calls have been made, after which the latch stays open.

pub mod concurrent;

pub use self::concurrent::{CountDownLatch, CountDownLatchError};
