//! Debounced layout persistence task

use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info};

use crate::state::AppState;

/// Quiet period after the last save request before writing
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Wait for the first request, then keep extending the window until requests
/// stop arriving. Returns the number of requests folded in, or `None` once
/// every sender is gone.
pub async fn next_coalesced_batch(rx: &mut mpsc::UnboundedReceiver<()>, window: Duration) -> Option<usize> {
    rx.recv().await?;
    let mut requests = 1;

    loop {
        tokio::select! {
            _ = sleep(window) => return Some(requests),
            received = rx.recv() => match received {
                Some(()) => requests += 1,
                None => return Some(requests),
            },
        }
    }
}

/// Background task writing the layout once per burst of changes
pub async fn layout_saver_task(state: Arc<AppState>, mut rx: mpsc::UnboundedReceiver<()>) {
    info!("Starting layout saver task");

    while let Some(requests) = next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await {
        debug!("Saving layout after {} change(s)", requests);
        // Failures are already surfaced on the status line
        let _ = state.save_now();
    }

    info!("Layout saver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn burst_within_window_is_one_batch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let batch = tokio::spawn(async move {
            let first = next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await;
            (first, rx)
        });

        for _ in 0..5 {
            tx.send(()).unwrap();
            advance(Duration::from_millis(100)).await;
        }

        let (first, mut rx) = batch.await.unwrap();
        assert_eq!(first, Some(5));

        tx.send(()).unwrap();
        drop(tx);
        assert_eq!(next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await, Some(1));
        assert_eq!(next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_after_the_window_start_a_new_batch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        assert_eq!(next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await, Some(1));

        tx.send(()).unwrap();
        tx.send(()).unwrap();
        assert_eq!(next_coalesced_batch(&mut rx, SAVE_DEBOUNCE).await, Some(2));
    }
}
