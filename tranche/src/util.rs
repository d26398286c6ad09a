use std::future::Future;
use std::time::Duration;

use tranche_core::TrancheError;

/// Run `fut` under an optional deadline.
///
/// With `None` the future runs to completion. When the deadline passes first
/// the future is dropped, aborting any in-flight work it owns, and the result
/// is `TrancheError::Cancelled`.
///
/// # Errors
/// Returns the future's own error, or `Cancelled` on deadline.
pub async fn with_request_deadline<F, T>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<T, TrancheError>
where
    F: Future<Output = Result<T, TrancheError>>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut).await.unwrap_or_else(|_| {
            Err(TrancheError::cancelled(format!(
                "request deadline of {}ms exceeded",
                d.as_millis()
            )))
        }),
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_maps_to_cancelled() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, TrancheError>(1)
        };
        let err = with_request_deadline(Some(Duration::from_millis(50)), slow)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("50ms"));
    }

    #[tokio::test]
    async fn no_deadline_passes_through() {
        let ok = with_request_deadline(None, async { Ok::<_, TrancheError>(7) }).await;
        assert_eq!(ok, Ok(7));
        let err = with_request_deadline(Some(Duration::from_secs(1)), async {
            Err::<u8, _>(TrancheError::upstream("u", "x"))
        })
        .await;
        assert!(err.unwrap_err().is_upstream());
    }
}
