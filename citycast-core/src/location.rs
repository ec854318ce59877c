//! Device location: one-shot fixes with a bounded wait, continuous updates,
//! and reverse geocoding of a fix into a place name.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc;

use crate::{error::LocationError, model::Coordinates};

pub mod geocode;
pub mod ip;
pub mod nominatim;

pub use geocode::{Address, Geocoder, Placemark, city_from_address};

pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    HighAccuracy,
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRequest {
    pub priority: Priority,
    pub interval: Duration,
    pub max_update_delay: Duration,
}

impl LocationRequest {
    /// High accuracy, 10s interval, updates delivered within 15s.
    pub fn single_fix() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval: Duration::from_secs(10),
            max_update_delay: Duration::from_secs(15),
        }
    }

    /// Balanced power, one update per `interval`.
    pub fn continuous(interval: Duration) -> Self {
        Self {
            priority: Priority::Balanced,
            interval,
            max_update_delay: interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type LocationCallback = Arc<dyn Fn(Coordinates) + Send + Sync>;

/// Callback-style device location service.
///
/// A subscription keeps delivering fixes to its callback until
/// `remove_updates` is called with its id.
pub trait LocationSource: Send + Sync + Debug {
    fn request_updates(
        &self,
        request: &LocationRequest,
        callback: LocationCallback,
    ) -> Result<SubscriptionId, LocationError>;

    fn remove_updates(&self, id: SubscriptionId);
}

/// Permission and OS settings as the device reports them right now.
pub trait DeviceSettings: Send + Sync + Debug {
    fn has_location_permission(&self) -> bool;
    fn is_location_enabled(&self) -> bool;
}

/// A fix together with its display address.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDetails {
    pub coordinates: Coordinates,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    geocoder: Arc<dyn Geocoder>,
    fix_timeout: Duration,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            source,
            geocoder,
            fix_timeout: DEFAULT_FIX_TIMEOUT,
        }
    }

    pub fn with_fix_timeout(mut self, fix_timeout: Duration) -> Self {
        self.fix_timeout = fix_timeout;
        self
    }

    /// Request one fresh high-accuracy fix.
    ///
    /// Resolves exactly once: with the first fix delivered, or `None` when the
    /// timeout elapses or the request can't be set up. The subscription is
    /// removed on every path, including when this future is dropped.
    pub async fn current_fix(&self) -> Option<Coordinates> {
        match self.request_fix().await {
            Ok(coords) => {
                tracing::debug!("Got location fix: {}", coords);
                Some(coords)
            }
            Err(LocationError::Timeout) => {
                tracing::warn!("No location fix within {:?}", self.fix_timeout);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to get location fix: {}", e);
                None
            }
        }
    }

    async fn request_fix(&self) -> Result<Coordinates, LocationError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let resolved = Arc::new(AtomicBool::new(false));

        let guard = Arc::clone(&resolved);
        let callback: LocationCallback = Arc::new(move |coords| {
            if guard
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _ = tx.send(coords);
            }
        });

        let _subscription = self.subscribe(&LocationRequest::single_fix(), callback)?;

        match tokio::time::timeout(self.fix_timeout, rx.recv()).await {
            Ok(Some(coords)) => Ok(coords),
            Ok(None) => Err(LocationError::Source("location updates ended".into())),
            Err(_) => {
                // Late deliveries after this point are dropped by the guard.
                resolved.store(true, Ordering::Release);
                Err(LocationError::Timeout)
            }
        }
    }

    fn subscribe(
        &self,
        request: &LocationRequest,
        callback: LocationCallback,
    ) -> Result<Subscription, LocationError> {
        let id = self.source.request_updates(request, callback)?;
        Ok(Subscription {
            source: Arc::clone(&self.source),
            id,
        })
    }

    /// Look up at most one address for `coords`.
    ///
    /// Never fails: a geocoder error yields `"Unable to get address"`, no
    /// candidates yield `"Unknown location"`, both with no city.
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Placemark {
        match self.geocoder.from_location(coords, 1).await {
            Ok(addresses) => match addresses.first() {
                Some(address) => {
                    let placemark = Placemark::from_address(address);
                    tracing::info!("Reverse geocoded {} to: {}", coords, placemark.address);
                    placemark
                }
                None => Placemark::unknown(),
            },
            Err(e) => {
                tracing::debug!("Reverse geocode failed: {}", e);
                Placemark::unavailable()
            }
        }
    }

    pub async fn city_name_for(&self, coords: Coordinates) -> Option<String> {
        self.reverse_geocode(coords).await.city
    }

    /// Fix plus display address; `None` when no fix could be had.
    pub async fn current_location_details(&self) -> Option<LocationDetails> {
        let coordinates = self.current_fix().await?;
        let placemark = self.reverse_geocode(coordinates).await;

        Some(LocationDetails {
            coordinates,
            address: placemark.address,
        })
    }

    /// Subscribe to continuous updates. Dropping the watch ends the subscription.
    pub fn watch(&self, interval: Duration) -> Result<LocationWatch, LocationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: LocationCallback = Arc::new(move |coords| {
            let _ = tx.send(coords);
        });

        let subscription = self.subscribe(&LocationRequest::continuous(interval), callback)?;

        Ok(LocationWatch {
            _subscription: subscription,
            rx,
        })
    }
}

/// An open subscription on a `LocationSource`, removed on drop.
#[derive(Debug)]
struct Subscription {
    source: Arc<dyn LocationSource>,
    id: SubscriptionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.source.remove_updates(self.id);
    }
}

/// Stream of fixes from a continuous subscription.
#[derive(Debug)]
pub struct LocationWatch {
    _subscription: Subscription,
    rx: mpsc::UnboundedReceiver<Coordinates>,
}

impl LocationWatch {
    pub async fn next(&mut self) -> Option<Coordinates> {
        self.rx.recv().await
    }
}
