use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{LocationSource, PositionEvent, WatchOptions};
use crate::geo::Coordinate;

/// A device that never moves.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    at: Coordinate,
}

impl FixedSource {
    pub fn new(at: Coordinate) -> Self {
        Self { at }
    }
}

#[async_trait]
impl LocationSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn watch(
        &self,
        _options: WatchOptions,
        sink: mpsc::UnboundedSender<PositionEvent>,
        cancel: CancellationToken,
    ) {
        if sink.send(PositionEvent::Fix(self.at)).is_err() {
            return;
        }
        cancel.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::WatchHandle;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fixed_source_emits_once() {
        let at = Coordinate::new_unchecked(23.8103, 90.4125);
        let (handle, mut rx) = WatchHandle::spawn(Arc::new(FixedSource::new(at)), WatchOptions::default());
        assert_eq!(rx.recv().await, Some(PositionEvent::Fix(at)));
        assert!(rx.try_recv().is_err());
        handle.stop().await;
    }
}
