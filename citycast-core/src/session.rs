//! The retrieval orchestrator: drives location resolution and the chained
//! current-weather and forecast lookups, and owns the session state.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tokio_util::task::TaskTracker;

use crate::{
    location::{DeviceSettings, LocationProvider, city_from_address},
    model::{Coordinates, LocationInfo, Query},
    prefs::Preferences,
    provider::WeatherProvider,
    state::{SessionState, StateStore},
};

pub const LOCATION_UNAVAILABLE: &str = "Unable to get current location";
pub const PERMISSION_REQUIRED: &str =
    "Location permission is required to get current location weather";

/// Handle to one weather session. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct WeatherSession {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    provider: Arc<dyn WeatherProvider>,
    location: LocationProvider,
    device: Arc<dyn DeviceSettings>,
    prefs: Preferences,
    state: StateStore,
    /// Id of the most recently issued lookup.
    latest_lookup: AtomicU64,
    background: TaskTracker,
}

impl WeatherSession {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        location: LocationProvider,
        device: Arc<dyn DeviceSettings>,
        prefs: Preferences,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                location,
                device,
                prefs,
                state: StateStore::new(),
                latest_lookup: AtomicU64::new(0),
                background: TaskTracker::new(),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// City to offer when nothing has been searched yet in this session.
    pub fn last_searched_city(&self) -> String {
        self.inner.prefs.last_city()
    }

    /// Wait for background forecast fetches to finish.
    pub async fn settle(&self) {
        let tracker = &self.inner.background;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }

    /// Look up current weather for `name`, then its forecast in the background.
    /// Blank names are ignored.
    pub async fn search_by_city(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("Ignoring blank city search");
            return;
        }
        self.lookup(Query::City(name.to_string())).await;
    }

    pub async fn search_by_coordinates(&self, coords: Coordinates) {
        self.lookup(Query::Coordinates(coords)).await;
    }

    /// Re-issue the query behind the current snapshot: by its resolved name for
    /// city lookups, by the same coordinates otherwise.
    pub async fn refresh(&self) {
        let state = self.state();
        match (state.current_weather, state.query) {
            (Some(_), Some(Query::Coordinates(coords))) => self.search_by_coordinates(coords).await,
            (Some(snapshot), _) => self.search_by_city(&snapshot.name).await,
            (None, _) => tracing::debug!("Nothing to refresh"),
        }
    }

    pub fn clear_error(&self) {
        self.inner.state.update(|s| SessionState { error: None, ..s.clone() });
    }

    fn is_latest(&self, id: u64) -> bool {
        self.inner.latest_lookup.load(Ordering::SeqCst) == id
    }

    async fn lookup(&self, query: Query) {
        let id = self.inner.latest_lookup.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.update(|s| SessionState {
            is_loading: true,
            error: None,
            ..s.clone()
        });

        match self.inner.provider.current(&query).await {
            Ok(snapshot) => {
                let city = snapshot.name.clone();
                let applied = self.inner.state.update_if(|s| {
                    if id < s.lookup_id {
                        return None;
                    }
                    // Keep the old forecast only while it still describes the same place.
                    let forecast = match &s.current_weather {
                        Some(prev) if prev.same_place(&snapshot) => s.forecast.clone(),
                        _ => None,
                    };
                    Some(SessionState {
                        current_weather: Some(snapshot),
                        forecast,
                        is_loading: s.is_loading && !self.is_latest(id),
                        query: Some(query.clone()),
                        lookup_id: id,
                        ..s.clone()
                    })
                });

                if !applied {
                    tracing::debug!("Discarding stale weather for {}", query);
                    return;
                }

                tracing::info!("Fetched current weather for {} as {}", query, city);
                self.inner.prefs.set_last_city(&city);
                self.spawn_forecast(id, query);
            }
            Err(e) => {
                let message = e.to_string();
                let applied = self.inner.state.update_if(|s| {
                    self.is_latest(id).then(|| SessionState {
                        error: Some(message),
                        is_loading: false,
                        ..s.clone()
                    })
                });

                if applied {
                    tracing::warn!("Weather lookup for {} failed: {}", query, e);
                } else {
                    tracing::debug!("Discarding stale failure for {}: {}", query, e);
                }
            }
        }
    }

    fn spawn_forecast(&self, id: u64, query: Query) {
        let session = self.clone();
        self.inner.background.spawn(async move {
            session.fetch_forecast(id, query).await;
        });
    }

    /// Failures stay in the log: a missing forecast never spoils current conditions.
    async fn fetch_forecast(&self, id: u64, query: Query) {
        match self.inner.provider.forecast(&query).await {
            Ok(forecast) => {
                let applied = self.inner.state.update_if(|s| {
                    (s.lookup_id == id).then(|| SessionState {
                        forecast: Some(forecast),
                        ..s.clone()
                    })
                });
                if !applied {
                    tracing::debug!("Discarding forecast for {}: superseded", query);
                }
            }
            Err(e) => tracing::warn!("Failed to fetch forecast for {}: {}", query, e),
        }
    }

    /// Start the "use my location" flow.
    ///
    /// Missing permission raises the permission request and a disabled location
    /// service raises the GPS warning; neither touches the location provider.
    /// Otherwise a fix is taken and geocoded, and the result waits in
    /// `location_info` for the user to confirm.
    pub async fn use_current_location(&self) {
        let device = &self.inner.device;

        if !device.has_location_permission() {
            self.inner.state.update(|s| SessionState {
                show_permission_request: true,
                error: None,
                is_loading: false,
                ..s.clone()
            });
            return;
        }

        if !device.is_location_enabled() {
            self.show_gps_warning();
            return;
        }

        self.inner.state.update(|s| SessionState {
            is_loading: true,
            error: None,
            ..s.clone()
        });

        match self.inner.location.current_location_details().await {
            Some(details) => {
                tracing::info!("Current location: {}", details.address);
                self.inner.state.update(|s| SessionState {
                    is_loading: false,
                    location_info: Some(LocationInfo {
                        latitude: details.coordinates.latitude,
                        longitude: details.coordinates.longitude,
                        address: details.address,
                    }),
                    show_location_dialog: true,
                    ..s.clone()
                });
            }
            None if !device.is_location_enabled() => {
                self.inner.state.update(|s| SessionState {
                    is_loading: false,
                    show_gps_warning_dialog: true,
                    ..s.clone()
                });
            }
            None => {
                self.inner.state.update(|s| SessionState {
                    is_loading: false,
                    error: Some(LOCATION_UNAVAILABLE.to_string()),
                    ..s.clone()
                });
            }
        }
    }

    /// Consume the pending location and look up its weather by city name.
    ///
    /// The name comes from reverse geocoding when available, else from the
    /// display address with house numbers skipped.
    pub async fn confirm_location_and_fetch(&self) {
        let mut pending = None;
        self.inner.state.update_if(|s| {
            pending = Some(s.location_info.clone()?);
            Some(SessionState {
                location_info: None,
                show_location_dialog: false,
                ..s.clone()
            })
        });

        let Some(info) = pending else {
            tracing::debug!("No pending location to confirm");
            return;
        };

        let city = match self.inner.location.city_name_for(info.coordinates()).await {
            Some(city) => city,
            None => city_from_address(&info.address),
        };
        tracing::info!("Confirmed location resolved to {}", city);

        self.search_by_city(&city).await;
    }

    /// The presentation layer reports the answer to a permission prompt. It is
    /// expected to have updated the device settings before calling this.
    pub async fn on_permission_resolved(&self, granted: bool) {
        if granted {
            self.dismiss_permission_request();
            self.use_current_location().await;
        } else {
            self.inner.state.update(|s| SessionState {
                show_permission_request: false,
                is_loading: false,
                error: Some(PERMISSION_REQUIRED.to_string()),
                ..s.clone()
            });
        }
    }

    fn show_gps_warning(&self) {
        self.inner.state.update(|s| SessionState {
            show_gps_warning_dialog: true,
            ..s.clone()
        });
    }

    pub fn dismiss_location_dialog(&self) {
        self.inner.state.update(|s| SessionState {
            show_location_dialog: false,
            location_info: None,
            ..s.clone()
        });
    }

    pub fn dismiss_gps_warning(&self) {
        self.inner.state.update(|s| SessionState {
            show_gps_warning_dialog: false,
            ..s.clone()
        });
    }

    pub fn dismiss_permission_request(&self) {
        self.inner.state.update(|s| SessionState {
            show_permission_request: false,
            ..s.clone()
        });
    }
}
