//! Cue duration timer

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A pending duration expiry for the active cue.
///
/// Dropping the timer cancels it. Cancelling is idempotent.
#[derive(Debug)]
pub(crate) struct CueTimer {
    cue_id: String,
    generation: u64,
    token: CancellationToken,
}

impl CueTimer {
    /// Spawn a task that runs `on_elapsed` after `duration` unless the
    /// timer is cancelled first.
    pub(crate) fn start<F, Fut>(
        cue_id: impl Into<String>,
        generation: u64,
        duration: Duration,
        on_elapsed: F,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cue_id = cue_id.into();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tracing::debug!(cue = %cue_id, generation, ?duration, "Cue timer started");

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(duration) => on_elapsed().await,
            }
        });

        Self {
            cue_id,
            generation,
            token,
        }
    }

    pub(crate) fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(
                cue = %self.cue_id,
                generation = self.generation,
                "Cue timer cancelled"
            );
            self.token.cancel();
        }
    }

    /// Whether an expiry carrying `generation` still belongs to this timer.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && !self.token.is_cancelled()
    }

    pub(crate) fn cue_id(&self) -> &str {
        &self.cue_id
    }
}

impl Drop for CueTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn flag() -> (Arc<AtomicBool>, impl FnOnce() -> futures::future::Ready<()> + Send) {
        let fired = Arc::new(AtomicBool::new(false));
        let set = Arc::clone(&fired);
        (fired, move || {
            set.store(true, Ordering::SeqCst);
            futures::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let (fired, on_elapsed) = flag();
        let timer = CueTimer::start("Q1", 1, Duration::from_secs(1), on_elapsed);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(timer.is_current(1));
        assert_eq!(timer.cue_id(), "Q1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (fired, on_elapsed) = flag();
        let timer = CueTimer::start("Q1", 1, Duration::from_secs(1), on_elapsed);

        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!fired.load(Ordering::SeqCst));
        assert!(!timer.is_current(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_timer_cancels_it() {
        let (fired, on_elapsed) = flag();
        drop(CueTimer::start("Q1", 1, Duration::from_secs(1), on_elapsed));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_not_current() {
        let (_, on_elapsed) = flag();
        let timer = CueTimer::start("Q2", 2, Duration::from_secs(1), on_elapsed);
        assert!(!timer.is_current(1));
        assert!(timer.is_current(2));
    }
}
