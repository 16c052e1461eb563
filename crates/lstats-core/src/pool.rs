//! Bounded worker pool for fan-out stages
//!
//! Exactly `limit` workers pull inputs from a shared queue and push results
//! to a shared output channel. Results come back in completion order, not
//! input order.
//!
//! The first worker to fail aborts the others and its error is returned.
//! Isolating expected per-item failures is the body's job.

use crate::error::PoolError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};

/// Fixed-size worker pool
#[derive(Debug, Clone)]
pub struct BoundedWorkerPool {
    /// Workers spawned per run
    limit: usize,
    /// Stage name used in log events
    name: &'static str,
}

impl BoundedWorkerPool {
    /// Create pool running at most `limit` bodies at once
    #[inline]
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            name: "pool",
        }
    }

    /// With stage name for log events
    #[inline]
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Worker limit
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `body` over every input
    ///
    /// # Returns
    /// One result per input, in completion order
    ///
    /// # Errors
    /// - `PoolError::ZeroLimit` (converted into `E`) if the limit is zero
    /// - the first error returned by `body`; remaining workers are aborted
    /// - `PoolError::WorkerPanicked` / `WorkerCancelled` if a worker dies
    pub async fn run<T, R, E, F, Fut>(
        &self,
        inputs: impl IntoIterator<Item = T>,
        body: F,
    ) -> Result<Vec<R>, E>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<PoolError> + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        if self.limit == 0 {
            return Err(PoolError::ZeroLimit.into());
        }

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let mut queued = 0usize;
        for input in inputs {
            // Receiver is alive until the end of this function
            let _ = input_tx.send(input);
            queued += 1;
        }
        drop(input_tx);

        tracing::debug!(
            pool = self.name,
            inputs = queued,
            workers = self.limit,
            "dispatching work"
        );

        let input_rx = Arc::new(Mutex::new(input_rx));
        let (output_tx, mut output_rx) = mpsc::unbounded_channel();
        let body = Arc::new(body);
        let mut workers = JoinSet::new();

        for _ in 0..self.limit {
            let input_rx = Arc::clone(&input_rx);
            let output_tx = output_tx.clone();
            let body = Arc::clone(&body);

            workers.spawn(async move {
                loop {
                    let next = input_rx.lock().await.recv().await;
                    let Some(input) = next else { break };
                    let result = body(input).await?;
                    if output_tx.send(result).is_err() {
                        break;
                    }
                }
                Ok::<(), E>(())
            });
        }
        drop(output_tx);

        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_error) => worker_failure(&join_error).into(),
            };
            workers.abort_all();
            tracing::debug!(pool = self.name, "worker failed, aborting remaining workers");
            return Err(failure);
        }

        let mut results = Vec::with_capacity(queued);
        while let Some(result) = output_rx.recv().await {
            results.push(result);
        }
        Ok(results)
    }
}

fn worker_failure(join_error: &JoinError) -> PoolError {
    if join_error.is_panic() {
        PoolError::WorkerPanicked(join_error.to_string())
    } else {
        PoolError::WorkerCancelled
    }
}
