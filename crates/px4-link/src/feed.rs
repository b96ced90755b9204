use crate::state::MissionItemReached;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Ordered stream of MISSION_ITEM_REACHED reports for one consumer.
///
/// Reports that overflow the broadcast buffer are skipped with a warning
/// rather than ending the stream.
pub struct MissionReachedFeed {
    rx: broadcast::Receiver<MissionItemReached>,
}

impl MissionReachedFeed {
    pub(crate) fn new(rx: broadcast::Receiver<MissionItemReached>) -> Self {
        Self { rx }
    }

    /// Next report, or `None` once the link is gone.
    pub async fn next(&mut self) -> Option<MissionItemReached> {
        loop {
            match self.rx.recv().await {
                Ok(reached) => return Some(reached),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "mission progress consumer lagged; reports dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reached(seq: u16) -> MissionItemReached {
        MissionItemReached {
            seq,
            received_at: Duration::from_secs(u64::from(seq)),
        }
    }

    #[tokio::test]
    async fn delivers_in_order_then_ends() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = MissionReachedFeed::new(rx);
        tx.send(reached(0)).unwrap();
        tx.send(reached(1)).unwrap();
        drop(tx);

        assert_eq!(feed.next().await, Some(reached(0)));
        assert_eq!(feed.next().await, Some(reached(1)));
        assert_eq!(feed.next().await, None);
    }

    #[tokio::test]
    async fn lag_skips_to_oldest_retained() {
        let (tx, rx) = broadcast::channel(2);
        let mut feed = MissionReachedFeed::new(rx);
        for seq in 0..5 {
            tx.send(reached(seq)).unwrap();
        }
        drop(tx);

        assert_eq!(feed.next().await, Some(reached(3)));
        assert_eq!(feed.next().await, Some(reached(4)));
        assert_eq!(feed.next().await, None);
    }
}
