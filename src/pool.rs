use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run one task per item and collect every task's return value.
///
/// - Tasks hand results back through their `JoinHandle`; no shared collection is mutated.
/// - `limit` bounds the number of tasks holding a socket at once.
/// - A cancelled token stops spawning and makes pending tasks return nothing.
/// - A panicking task is dropped without affecting its siblings.
///
/// Output order is completion order.
pub async fn fan_out<I, F, Fut, T>(
    items: I,
    limit: &Arc<Semaphore>,
    cancel: &CancellationToken,
    f: F,
) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut set = JoinSet::new();

    for item in items {
        if cancel.is_cancelled() {
            break;
        }
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            p = limit.clone().acquire_owned() => match p {
                Ok(p) => p,
                Err(_) => break,
            },
        };
        let cancel = cancel.clone();
        let fut = f(item);
        set.spawn(async move {
            let _permit = permit; // keep permit until task completes
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                out = fut => Some(out),
            }
        });
    }

    let mut out = Vec::with_capacity(set.len());
    while let Some(res) = set.join_next().await {
        match res {
            Ok(Some(v)) => out.push(v),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "scan task aborted"),
        }
    }
    out
}
