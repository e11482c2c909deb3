//! Bounded worker pool for batch network operations.
//!
//! Every batch (fetch-many, page fetch, validate-many) runs its tasks on a
//! [`JoinSet`] gated by a [`Semaphore`], and joins them under one overall
//! deadline. Tasks still running when the deadline passes are aborted and
//! their slots come back as `None`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `tasks` with at most `limit` in flight, preserving input order.
pub async fn bounded_join<T, Fut>(tasks: Vec<Fut>, limit: usize, deadline: Duration) -> Vec<Option<T>>
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let total = tasks.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();

    for (idx, task) in tasks.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            // The semaphore is never closed, so acquisition cannot fail.
            let _permit = semaphore.acquire_owned().await.ok();
            (idx, task.await)
        });
    }

    let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let until = tokio::time::Instant::now() + deadline;

    loop {
        match tokio::time::timeout_at(until, set.join_next()).await {
            Ok(Some(Ok((idx, value)))) => results[idx] = Some(value),
            Ok(Some(Err(e))) => tracing::warn!(error = %e, "batch worker failed"),
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    abandoned = set.len(),
                    deadline_ms = deadline.as_millis() as u64,
                    "batch deadline elapsed, abandoning remaining workers"
                );
                set.abort_all();
                break;
            }
        }
    }

    results
}
