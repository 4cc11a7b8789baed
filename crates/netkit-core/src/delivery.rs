//! Asynchronous delivery adapters
//!
//! The pipeline itself is synchronous. These adapters run it on Tokio's
//! blocking pool and deliver exactly one terminal [`ApiResult`], either as
//! a future or through a callback.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::classifier::classify;
use crate::client::NetworkClient;
use crate::fault::Fault;
use crate::http::Request;
use crate::result::{ApiResult, BooleanResult};

/// Run a blocking call with an optional deadline
///
/// An elapsed deadline yields the timeout error; the blocking call is
/// abandoned, not interrupted.
pub async fn run_blocking<T, F>(
    client: Arc<NetworkClient>,
    timeout: Option<Duration>,
    call: F,
) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&NetworkClient) -> ApiResult<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || call(&client));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                debug!(timeout_ms = limit.as_millis() as u64, "Call exceeded its deadline");
                return ApiResult::Error(classify(Fault::Timeout));
            }
        },
        None => task.await,
    };

    joined.unwrap_or_else(|e| ApiResult::Error(classify(Fault::unknown_message(e.to_string()))))
}

/// Future-returning form of [`NetworkClient::call`]
pub async fn call_async<T>(
    client: Arc<NetworkClient>,
    request: Request,
    timeout: Option<Duration>,
) -> ApiResult<T>
where
    T: DeserializeOwned + Send + 'static,
{
    run_blocking(client, timeout, move |client| client.call(request)).await
}

/// Future-returning form of [`NetworkClient::call_boolean`]
pub async fn call_boolean_async(
    client: Arc<NetworkClient>,
    request: Request,
    timeout: Option<Duration>,
) -> BooleanResult {
    run_blocking(client, timeout, move |client| client.call_boolean(request)).await
}

/// Handle to an enqueued call
#[derive(Debug)]
pub struct CallHandle {
    task: JoinHandle<()>,
}

impl CallHandle {
    /// Abandon the call; the callback will not run if it has not yet
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the callback ran or the call was cancelled
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                debug!(error = %e, "Enqueued call did not complete");
            }
        }
    }
}

/// Callback form of [`NetworkClient::call`]
///
/// Must be called from within a Tokio runtime. Route the result to a
/// [`ResponseListener`](crate::ResponseListener) with
/// [`ApiResult::dispatch`].
pub fn enqueue<T, F>(
    client: Arc<NetworkClient>,
    request: Request,
    timeout: Option<Duration>,
    callback: F,
) -> CallHandle
where
    T: DeserializeOwned + Send + 'static,
    F: FnOnce(ApiResult<T>) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let result = call_async(client, request, timeout).await;
        callback(result);
    });
    CallHandle { task }
}
