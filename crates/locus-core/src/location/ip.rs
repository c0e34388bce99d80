use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{pause, LocationError, LocationSource, PositionEvent, WatchOptions};
use crate::geo::Coordinate;

/// Response shape of ip-api.com style lookups.
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

/// Coarse positioning from the public IP address, polled periodically.
#[derive(Clone)]
pub struct IpLocationSource {
    client: Client,
    url: String,
}

impl IpLocationSource {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    pub async fn lookup(&self) -> Result<Coordinate, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!("lookup failed with status {}", status)));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;
        coordinate_from_lookup(body)
    }
}

fn coordinate_from_lookup(body: IpLookupResponse) -> Result<Coordinate, LocationError> {
    if body.status != "success" {
        return Err(LocationError::Unavailable(
            body.message.unwrap_or_else(|| format!("lookup status {}", body.status)),
        ));
    }
    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => {
            Coordinate::new(lat, lon).map_err(|e| LocationError::Unavailable(e.to_string()))
        }
        _ => Err(LocationError::Unavailable("lookup returned no coordinates".to_string())),
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    fn name(&self) -> &'static str {
        "ip"
    }

    async fn watch(
        &self,
        options: WatchOptions,
        sink: mpsc::UnboundedSender<PositionEvent>,
        cancel: CancellationToken,
    ) {
        if options.high_accuracy {
            debug!(target: "location::ip", "High accuracy requested; IP lookup is city-level at best");
        }

        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                result = self.lookup() => match result {
                    Ok(at) => PositionEvent::Fix(at),
                    Err(e) => {
                        warn!(target: "location::ip", "IP lookup failed: {}", e);
                        PositionEvent::Failed(e)
                    }
                },
            };

            if sink.send(event).is_err() {
                return;
            }
            if !pause(&cancel, options.poll_interval).await {
                return;
            }
        }
    }
}
