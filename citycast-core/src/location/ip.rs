//! Approximate device location from the public IP address.
//!
//! Stands in for a satellite fix on machines without one. Each subscription
//! polls the lookup endpoint on the request interval until it is removed.

use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::task::JoinHandle;

use super::{LocationCallback, LocationRequest, LocationSource, SubscriptionId};
use crate::{error::LocationError, model::Coordinates};

pub const IP_API_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

#[derive(Debug)]
pub struct IpLocationSource {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl IpLocationSource {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_endpoint(IP_API_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LocationError::Source(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        })
    }
}

async fn lookup(http: &Client, endpoint: &str) -> Result<Coordinates, LocationError> {
    let body: IpApiResponse = http
        .get(endpoint)
        .query(&[("fields", "status,message,lat,lon")])
        .send()
        .await
        .map_err(|e| LocationError::Source(e.to_string()))?
        .json()
        .await
        .map_err(|e| LocationError::Source(e.to_string()))?;

    match (body.status.as_str(), body.lat, body.lon) {
        ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(LocationError::Source(
            body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
        )),
    }
}

impl LocationSource for IpLocationSource {
    fn request_updates(
        &self,
        request: &LocationRequest,
        callback: LocationCallback,
    ) -> Result<SubscriptionId, LocationError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LocationError::Source(e.to_string()))?;

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let interval = request.interval.max(Duration::from_secs(1));

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match lookup(&http, &endpoint).await {
                    Ok(coords) => callback(coords),
                    Err(e) => tracing::debug!("IP location lookup failed: {}", e),
                }
            }
        });

        self.tasks.lock().insert(id, handle);
        Ok(id)
    }

    fn remove_updates(&self, id: SubscriptionId) {
        if let Some(handle) = self.tasks.lock().remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for IpLocationSource {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}
