//! Transfer progress reporting.

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;

/// Bytes moved so far out of an optional known total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferProgress {
    pub bytes_transferred: u64,
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred: 0,
            total_bytes,
        }
    }

    /// Whole percentage, clamped to 100. Zero while the total is unknown.
    pub fn percent(&self) -> u8 {
        match self.total_bytes {
            Some(total) if total > 0 => {
                let pct = self.bytes_transferred.saturating_mul(100) / total;
                pct.min(100) as u8
            }
            _ => 0,
        }
    }
}

/// Sampled view of a running transfer.
pub type ProgressSignal = watch::Receiver<TransferProgress>;

/// Wrap a byte stream so every chunk pulled through it updates a
/// [`ProgressSignal`].
///
/// Counts only grow, so the signal's percentage never decreases.
pub fn track_progress<E>(
    stream: BoxStream<'static, Result<Bytes, E>>,
    total_bytes: Option<u64>,
) -> (BoxStream<'static, Result<Bytes, E>>, ProgressSignal)
where
    E: Send + 'static,
{
    let (tx, rx) = watch::channel(TransferProgress::new(total_bytes));

    let counted = stream
        .inspect(move |item| {
            if let Ok(chunk) = item {
                let len = chunk.len() as u64;
                tx.send_modify(|p| p.bytes_transferred += len);
            }
        })
        .boxed();

    (counted, rx)
}

/// Emits each multiple of `step` percent once, in increasing order.
#[derive(Debug, Clone)]
pub struct ProgressMilestones {
    step: u8,
    last: u8,
}

impl Default for ProgressMilestones {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressMilestones {
    pub fn new(step: u8) -> Self {
        Self {
            step: step.clamp(1, 100),
            last: 0,
        }
    }

    /// Thresholds crossed since the previous call.
    pub fn advance(&mut self, percent: u8) -> Vec<u8> {
        let percent = percent.min(100);
        let mut crossed = Vec::new();
        while let Some(next) = self.last.checked_add(self.step) {
            if next > percent || next > 100 {
                break;
            }
            crossed.push(next);
            self.last = next;
        }
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_percent_clamps_and_handles_unknown_total() {
        let p = TransferProgress {
            bytes_transferred: 150,
            total_bytes: Some(100),
        };
        assert_eq!(p.percent(), 100);

        let unknown = TransferProgress {
            bytes_transferred: 150,
            total_bytes: None,
        };
        assert_eq!(unknown.percent(), 0);

        let half = TransferProgress {
            bytes_transferred: 50,
            total_bytes: Some(100),
        };
        assert_eq!(half.percent(), 50);
    }

    #[tokio::test]
    async fn test_track_progress_is_monotonic() {
        let chunks: Vec<Result<Bytes, ()>> = (0..10).map(|_| Ok(Bytes::from(vec![0u8; 10]))).collect();
        let (mut counted, signal) = track_progress(stream::iter(chunks).boxed(), Some(100));

        let mut last = 0;
        while let Some(chunk) = counted.next().await {
            chunk.unwrap();
            let pct = signal.borrow().percent();
            assert!(pct >= last);
            last = pct;
        }

        assert_eq!(signal.borrow().bytes_transferred, 100);
        assert_eq!(last, 100);
    }

    #[test]
    fn test_milestones_fire_once_each() {
        let mut m = ProgressMilestones::default();
        assert!(m.advance(5).is_empty());
        assert_eq!(m.advance(10), vec![10]);
        assert!(m.advance(15).is_empty());
        assert_eq!(m.advance(42), vec![20, 30, 40]);
        assert!(m.advance(40).is_empty());
        assert_eq!(m.advance(100), vec![50, 60, 70, 80, 90, 100]);
        assert!(m.advance(100).is_empty());
    }
}
