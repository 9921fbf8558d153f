//! Bounds every outbound RPC call made by a checker.
//!
//! On timeout the inner future is dropped (Tokio does not forcibly abort
//! it); the checker records the timeout as `last_error` exactly like any
//! other transient failure, per §5 and §7 — it never blocks a tick.

use crate::error::CheckError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default per-request timeout for outbound RPC calls (§5, `RPCRequestTimeout`).
pub const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `fut` under a deadline of `duration`; maps an elapsed deadline to
/// [`CheckError::Timeout`] instead of propagating a panic or hanging.
pub async fn bounded<T, Fut>(duration: Duration, fut: Fut) -> Result<T, CheckError>
where
    Fut: Future<Output = Result<T, CheckError>>,
{
    let start = Instant::now();
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(CheckError::Timeout { after: start.elapsed() }),
    }
}
