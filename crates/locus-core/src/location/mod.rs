//! Position tracking.
//!
//! A [`LocationSource`] streams [`PositionEvent`]s until its cancellation token
//! fires, then releases whatever it subscribed to. [`WatchHandle`] owns one
//! running subscription and guarantees it is cancelled when the handle is
//! stopped or dropped.

pub mod fixed;
pub mod ip;
pub mod replay;

pub use fixed::FixedSource;
pub use ip::IpLocationSource;
pub use replay::ReplaySource;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::geo::Coordinate;
use crate::provider::LocationProvider;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(Coordinate),
    Failed(LocationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            poll_interval: Duration::from_secs(30),
        }
    }
}

impl WatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            high_accuracy: config.high_accuracy(),
            poll_interval: config.poll_interval(),
        }
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stream position events into `sink` until `cancel` fires or the
    /// receiver goes away. Returning means the subscription is released.
    async fn watch(
        &self,
        options: WatchOptions,
        sink: mpsc::UnboundedSender<PositionEvent>,
        cancel: CancellationToken,
    );
}

/// One live location subscription.
pub struct WatchHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn spawn(
        source: Arc<dyn LocationSource>,
        options: WatchOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PositionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(target: "location::watch", source = source.name(), high_accuracy = options.high_accuracy, "Starting location watch");
            source.watch(options, tx, token).await;
            debug!(target: "location::watch", source = source.name(), "Location watch released");
        });

        (
            Self {
                cancel,
                task: Some(task),
            },
            rx,
        )
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel and wait until the source has released its subscription.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(target: "location::watch", "Location task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Sleep for `period`, returning `false` early if cancelled.
pub(crate) async fn pause(cancel: &CancellationToken, period: Duration) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(period) => true,
    }
}

/// Build the source the config asks for.
pub fn source_from_config(
    config: &Config,
    http: reqwest::Client,
) -> Result<Arc<dyn LocationSource>, LocationError> {
    match config.location_provider() {
        LocationProvider::Fixed => {
            let at = config
                .fixed_location()
                .map_err(|e| LocationError::Unavailable(e.to_string()))?
                .ok_or_else(|| LocationError::Unavailable("no fixed location configured".to_string()))?;
            Ok(Arc::new(FixedSource::new(at)))
        }
        LocationProvider::Replay => {
            let path = config
                .replay_file
                .as_ref()
                .ok_or_else(|| LocationError::Unavailable("no replay file configured".to_string()))?;
            let source = ReplaySource::from_file(path)
                .map_err(|e| LocationError::Unavailable(e.to_string()))?;
            debug!(target: "location::replay", path = %path.display(), fixes = source.len(), "Loaded replay track");
            Ok(Arc::new(source))
        }
        LocationProvider::Ip => Ok(Arc::new(IpLocationSource::new(http, config.ip_lookup_url()))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts subscriptions and releases.
    #[derive(Default)]
    pub struct CountingSource {
        pub started: AtomicUsize,
        pub released: AtomicUsize,
    }

    #[async_trait]
    impl LocationSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn watch(
            &self,
            _options: WatchOptions,
            sink: mpsc::UnboundedSender<PositionEvent>,
            cancel: CancellationToken,
        ) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _ = sink.send(PositionEvent::Fix(Coordinate::new_unchecked(1.0, 2.0)));
            cancel.cancelled().await;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_stop_releases_exactly_once() {
        let source = Arc::new(CountingSource::default());
        let (handle, mut rx) = WatchHandle::spawn(source.clone(), WatchOptions::default());

        assert_eq!(
            rx.recv().await,
            Some(PositionEvent::Fix(Coordinate::new_unchecked(1.0, 2.0)))
        );
        assert!(handle.is_active());
        assert_eq!(source.started.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 0);

        handle.stop().await;
        assert_eq!(source.started.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
        // Channel closes once the source is gone.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_drop_releases_exactly_once() {
        let source = Arc::new(CountingSource::default());
        {
            let (_handle, mut rx) = WatchHandle::spawn(source.clone(), WatchOptions::default());
            rx.recv().await;
        }
        wait_for(&source.released, 1).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_source_from_config_without_fixed_location() {
        let config = Config {
            location_provider: Some("fixed".to_string()),
            ..Config::new()
        };
        let result = source_from_config(&config, reqwest::Client::new());
        assert!(matches!(result, Err(LocationError::Unavailable(_))));
    }

    #[test]
    fn test_source_from_config_fixed() {
        let config = Config {
            location_provider: Some("fixed".to_string()),
            fixed_location: Some("23.81, 90.41".to_string()),
            ..Config::new()
        };
        let source = source_from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(source.name(), "fixed");
    }

    #[tokio::test]
    async fn test_source_from_config_replay_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"23.81, 90.41\n").unwrap();
        let config = Config {
            location_provider: Some("replay".to_string()),
            replay_file: Some(file.path().to_path_buf()),
            ..Config::new()
        };
        let source = source_from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(source.name(), "replay");

        let (handle, mut rx) = WatchHandle::spawn(source, WatchOptions::default());
        assert_eq!(
            rx.recv().await,
            Some(PositionEvent::Fix(Coordinate::new_unchecked(23.81, 90.41)))
        );
        handle.stop().await;
    }
}
