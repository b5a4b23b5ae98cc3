//! Settle-all fan-out over adapters

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;

use crate::error::PluginResult;
use crate::plugin::Plugin;

/// Await every call concurrently and log the failures. A failing adapter
/// never blocks or aborts its siblings.
///
/// `calls` holds one future per entry of `plugins`, in the same order.
/// They are collected up front so no borrowing iterator lives across the
/// await.
pub(crate) async fn settle_all<P, F>(plugins: &[Arc<P>], action: &str, calls: Vec<F>) -> usize
where
    P: Plugin + ?Sized,
    F: Future<Output = PluginResult<()>>,
{
    let results = join_all(calls).await;
    let mut failures = 0;

    for (plugin, result) in plugins.iter().zip(results) {
        if let Err(error) = result {
            failures += 1;
            tracing::warn!(
                plugin = plugin.name(),
                action,
                error = %error,
                "Adapter call failed"
            );
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Plugin for Counter {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> PluginResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PluginError::failed("boom"))
            } else {
                Ok(())
            }
        }
    }

    fn counter(name: &'static str, fail: bool) -> Arc<Counter> {
        Arc::new(Counter {
            name,
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() {
        let plugins = vec![counter("bad", true), counter("good", false)];

        let calls: Vec<_> = plugins.iter().map(|p| p.start()).collect();
        let failures = settle_all(&plugins, "start", calls).await;

        assert_eq!(failures, 1);
        assert!(plugins.iter().all(|p| p.calls.load(Ordering::SeqCst) == 1));
    }

    #[tokio::test]
    async fn test_empty_fanout() {
        let plugins: Vec<Arc<Counter>> = Vec::new();
        let calls: Vec<_> = plugins.iter().map(|p| p.start()).collect();
        let failures = settle_all(&plugins, "start", calls).await;
        assert_eq!(failures, 0);
    }
}
