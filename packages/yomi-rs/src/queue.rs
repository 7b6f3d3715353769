//! Small handoff queue between a source loop and its refinement worker.
//!
//! When full, pushing evicts the oldest job: a fresher capture always
//! supersedes a stale refinement, so delivery is best effort.
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

struct QueueState<T> {
  items: VecDeque<T>,
  closed: bool,
}

pub struct RefinementQueue<T> {
  state: Mutex<QueueState<T>>,
  notify: Notify,
  capacity: usize,
}

impl<T> RefinementQueue<T> {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      state: Mutex::new(QueueState {
        items: VecDeque::with_capacity(capacity),
        closed: false,
      }),
      notify: Notify::new(),
      capacity,
    }
  }

  fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
    // Nothing panics under the lock; a poisoned state is still consistent.
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Enqueues `job`, returning whatever was dropped to make room.
  ///
  /// A closed queue accepts nothing and hands `job` straight back.
  pub fn push(&self, job: T) -> Option<T> {
    let evicted = {
      let mut state = self.lock();
      if state.closed {
        return Some(job);
      }
      let evicted = if state.items.len() >= self.capacity {
        state.items.pop_front()
      } else {
        None
      };
      state.items.push_back(job);
      evicted
    };
    self.notify.notify_one();
    evicted
  }

  /// Waits for the next job; `None` once the queue is closed and drained.
  pub async fn pop(&self) -> Option<T> {
    loop {
      {
        let mut state = self.lock();
        if let Some(job) = state.items.pop_front() {
          return Some(job);
        }
        if state.closed {
          return None;
        }
      }
      self.notify.notified().await;
    }
  }

  /// Stops accepting jobs. Jobs already queued are still handed out.
  pub fn close(&self) {
    self.lock().closed = true;
    self.notify.notify_waiters();
    self.notify.notify_one();
  }

  pub fn len(&self) -> usize {
    self.lock().items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::time::Duration;

  #[test]
  fn test_full_queue_drops_oldest() {
    let queue = RefinementQueue::new(2);
    assert_eq!(queue.push(1), None);
    assert_eq!(queue.push(2), None);
    assert_eq!(queue.push(3), Some(1));
    assert_eq!(queue.len(), 2);
  }

  #[tokio::test]
  async fn test_pop_returns_in_fifo_order() {
    let queue = RefinementQueue::new(4);
    queue.push("a");
    queue.push("b");
    assert_eq!(queue.pop().await, Some("a"));
    assert_eq!(queue.pop().await, Some("b"));
    assert!(queue.is_empty());
  }

  #[tokio::test]
  async fn test_pop_waits_for_push() {
    let queue = Arc::new(RefinementQueue::new(1));
    let consumer = {
      let queue = queue.clone();
      tokio::spawn(async move { queue.pop().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.push(7);
    assert_eq!(consumer.await.unwrap(), Some(7));
  }

  #[tokio::test]
  async fn test_close_drains_then_ends() {
    let queue = RefinementQueue::new(4);
    queue.push(1);
    queue.close();
    assert_eq!(queue.push(2), Some(2));
    assert_eq!(queue.pop().await, Some(1));
    assert_eq!(queue.pop().await, None);
  }

  #[tokio::test]
  async fn test_close_wakes_waiting_consumer() {
    let queue: Arc<RefinementQueue<u8>> = Arc::new(RefinementQueue::new(1));
    let consumer = {
      let queue = queue.clone();
      tokio::spawn(async move { queue.pop().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.close();
    assert_eq!(consumer.await.unwrap(), None);
  }
}
