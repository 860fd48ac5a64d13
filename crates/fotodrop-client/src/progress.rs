//! Upload progress as an explicit event stream.
//!
//! The submit routine emits an ordered sequence of percentage values while
//! the request body streams out, terminated by exactly one `Completed` or
//! `Failed` event. A single reconciliation routine consumes the terminal
//! event and updates controller state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use fotodrop_core::UploadResponse;
use futures::stream::Stream;
use tokio::sync::mpsc::UnboundedSender;

const CHUNK_SIZE: usize = 64 * 1024;

/// Terminal result of one submit.
#[derive(Clone, Debug)]
pub enum UploadOutcome {
    /// `200` — the server processed the batch (possibly with per-file errors).
    Accepted(UploadResponse),
    /// `401` — the backend is not connected; retry later.
    Unauthorized { auth_url: Option<String> },
    /// Any other non-200 status.
    ServerError(u16),
}

#[derive(Clone, Debug)]
pub enum UploadEvent {
    /// Bytes-sent over bytes-total, 0–100.
    Progress(f64),
    Completed(UploadOutcome),
    /// Transport-level failure before a response arrived.
    Failed(String),
}

pub(crate) fn percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (sent as f64 / total as f64) * 100.0
}

/// Split one file's bytes into chunks, bumping the shared sent-counter and
/// emitting a progress event as each chunk leaves.
pub(crate) fn progress_chunks(
    data: Bytes,
    sent: Arc<AtomicU64>,
    total: u64,
    events: UnboundedSender<UploadEvent>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(CHUNK_SIZE.max(1))
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect();

    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let so_far = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        let _ = events.send(UploadEvent::Progress(percent(so_far, total)));
        Ok(chunk)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let data = Bytes::from(vec![0u8; 200 * 1024]);
        let total = data.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let chunks: Vec<_> = progress_chunks(data, sent, total, tx).collect().await;
        assert_eq!(chunks.len(), 4); // 200 KiB in 64 KiB chunks

        let mut last = 0.0;
        while let Ok(event) = rx.try_recv() {
            let UploadEvent::Progress(pct) = event else {
                panic!("only progress events are emitted here");
            };
            assert!(pct >= last);
            last = pct;
        }
        assert!((last - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_body_counts_as_fully_sent() {
        assert!((percent(0, 0) - 100.0).abs() < f64::EPSILON);
        assert!((percent(50, 200) - 25.0).abs() < f64::EPSILON);
    }
}
