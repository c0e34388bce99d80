use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{pause, LocationError, LocationSource, PositionEvent, WatchOptions};
use crate::geo::{parse_coordinate, Coordinate};

/// Plays back a recorded track, one fix per poll interval, then holds the
/// last position.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    fixes: Vec<Coordinate>,
}

impl ReplaySource {
    pub fn new(fixes: Vec<Coordinate>) -> Self {
        Self { fixes }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// One `lat, lng` per line. Blank lines and `#` comments are ignored;
    /// bad lines are skipped.
    pub fn parse(content: &str) -> Self {
        let fixes = content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .filter_map(|(idx, line)| match parse_coordinate(line) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(target: "location::replay", line = idx + 1, "Skipping replay line: {}", e);
                    None
                }
            })
            .collect();
        Self { fixes }
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

#[async_trait]
impl LocationSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn watch(
        &self,
        options: WatchOptions,
        sink: mpsc::UnboundedSender<PositionEvent>,
        cancel: CancellationToken,
    ) {
        if self.is_empty() {
            let _ = sink.send(PositionEvent::Failed(LocationError::Unavailable(
                "replay track has no positions".to_string(),
            )));
        }

        for (idx, fix) in self.fixes.iter().enumerate() {
            if idx > 0 && !pause(&cancel, options.poll_interval).await {
                return;
            }
            if sink.send(PositionEvent::Fix(*fix)).is_err() {
                return;
            }
        }

        cancel.cancelled().await;
    }
}
