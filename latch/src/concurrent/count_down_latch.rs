use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;


/// An error that occurs when a latch cannot be created.<br/>
/// ラッチを生成できない場合に発生するエラー。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountDownLatchError {
  #[error("invalid initial count: {0} (must be >= 0)")]
  InvalidArgument(i64),
}

struct Inner {
  count: Mutex<usize>,
  condvar: Condvar,
}

impl Inner {
  // The guarded value is a single integer written in one step, so a poisoned
  // lock still holds a consistent count.
  fn lock(&self) -> MutexGuard<'_, usize> {
    self.count.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// A synchronization aid that lets threads wait until a fixed number of
/// `count_down` calls have been made by other threads.<br/>
/// 他のスレッドで一定回数の `count_down` が呼ばれるまで待機するための同期機構。
///
/// Once the count reaches zero the latch stays open: every later `wait`
/// returns `true` immediately and further `count_down` calls do nothing.
/// Clones share the same counter.
#[derive(Clone)]
pub struct CountDownLatch {
  inner: Arc<Inner>,
}

impl Debug for CountDownLatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CountDownLatch").field("count", &self.count()).finish()
  }
}

impl Display for CountDownLatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "CountDownLatch@{:p} (Count = {})",
      Arc::as_ptr(&self.inner),
      self.count()
    )
  }
}

impl Eq for CountDownLatch {}

impl PartialEq for CountDownLatch {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Default for CountDownLatch {
  fn default() -> Self {
    Self::with_count(0)
  }
}

impl TryFrom<i64> for CountDownLatch {
  type Error = CountDownLatchError;

  fn try_from(count: i64) -> Result<Self, Self::Error> {
    Self::new(count)
  }
}

impl CountDownLatch {
  /// Creates a latch that opens after `count` calls to [`CountDownLatch::count_down`].
  ///
  /// Returns [`CountDownLatchError::InvalidArgument`] if `count` is negative.
  pub fn new(count: i64) -> Result<Self, CountDownLatchError> {
    let count = usize::try_from(count).map_err(|_| CountDownLatchError::InvalidArgument(count))?;
    Ok(Self::with_count(count))
  }

  pub fn with_count(count: usize) -> Self {
    Self {
      inner: Arc::new(Inner {
        count: Mutex::new(count),
        condvar: Condvar::new(),
      }),
    }
  }

  /// Decrements the count, releasing every waiting thread when it reaches zero.
  /// Does nothing if the count is already zero.
  pub fn count_down(&self) {
    let mut count = self.inner.lock();
    if *count == 0 {
      tracing::trace!("CountDownLatch::count_down: already released");
      return;
    }
    *count -= 1;
    tracing::trace!("CountDownLatch::count_down: count={}", *count);
    if *count == 0 {
      tracing::debug!("CountDownLatch::count_down: released");
      self.inner.condvar.notify_all();
    }
  }

  /// Returns the current count. Intended for diagnostics and tests.
  pub fn count(&self) -> usize {
    *self.inner.lock()
  }

  /// Blocks until the count reaches zero or `timeout` elapses.
  ///
  /// `None` waits indefinitely. Returns `true` if the latch was released and
  /// `false` if the timeout elapsed first; a timed out wait leaves the latch
  /// untouched.
  pub fn wait(&self, timeout: Option<Duration>) -> bool {
    let count = self.inner.lock();
    if *count == 0 {
      return true;
    }
    tracing::trace!("CountDownLatch::wait: blocking, count={}, timeout={:?}", *count, timeout);
    match timeout {
      None => {
        let _count = self
          .inner
          .condvar
          .wait_while(count, |count| *count > 0)
          .unwrap_or_else(PoisonError::into_inner);
        true
      }
      Some(timeout) => {
        let (count, _) = self
          .inner
          .condvar
          .wait_timeout_while(count, timeout, |count| *count > 0)
          .unwrap_or_else(PoisonError::into_inner);
        let released = *count == 0;
        if !released {
          tracing::debug!("CountDownLatch::wait: timed out after {:?}, count={}", timeout, *count);
        }
        released
      }
    }
  }

  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    self.wait(Some(timeout))
  }
}
