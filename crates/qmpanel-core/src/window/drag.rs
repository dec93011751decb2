use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Single-shot drag-hover timer.
///
/// Posts `event` on `tx` once `delay` has elapsed. Dropping the timer aborts
/// the pending task; an expiry that was already queued is recognised as stale
/// through its generation.
#[derive(Debug)]
pub struct DragTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl DragTimer {
    /// Arm a timer. Must be called from within a tokio runtime.
    pub fn start<E>(delay: Duration, generation: u64, tx: UnboundedSender<E>, event: E) -> Self
    where
        E: Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });

        Self { generation, task }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for DragTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        let _timer = DragTimer::start(Duration::from_millis(500), 1, tx, 42u32);

        assert_eq!(rx.recv().await, Some(42));
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        let timer = DragTimer::start(Duration::from_millis(500), 1, tx, 42);
        drop(timer);

        // The aborted task drops its sender, closing the channel without a value.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_is_kept() {
        let (tx, _rx) = mpsc::unbounded_channel::<()>();
        let timer = DragTimer::start(Duration::from_secs(1), 7, tx, ());
        assert_eq!(timer.generation(), 7);
    }
}
