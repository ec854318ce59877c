use tokio::sync::watch;

use crate::model::{ForecastSeries, LocationInfo, Query, WeatherSnapshot};

/// Everything the presentation layer renders.
///
/// Consumers only ever see whole snapshots; each update publishes a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_weather: Option<WeatherSnapshot>,
    pub forecast: Option<ForecastSeries>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub show_location_dialog: bool,
    pub location_info: Option<LocationInfo>,
    pub show_gps_warning_dialog: bool,
    pub show_permission_request: bool,
    /// Query that produced `current_weather`.
    pub query: Option<Query>,
    /// Sequence number of the lookup that produced `current_weather`; 0 before any.
    pub lookup_id: u64,
}

impl SessionState {
    pub fn has_dialog(&self) -> bool {
        self.show_location_dialog || self.show_gps_warning_dialog || self.show_permission_request
    }
}

/// Single-writer holder of the session state.
#[derive(Debug)]
pub(crate) struct StateStore {
    tx: watch::Sender<SessionState>,
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Replace the state with `f(current)`. Read and write happen under one lock.
    pub fn update(&self, f: impl FnOnce(&SessionState) -> SessionState) {
        self.tx.send_modify(|state| {
            let next = f(state);
            *state = next;
        });
    }

    /// Like `update`, but `f` may decline by returning `None`; nothing is published then.
    pub fn update_if(&self, f: impl FnOnce(&SessionState) -> Option<SessionState>) -> bool {
        self.tx.send_if_modified(|state| match f(state) {
            Some(next) => {
                *state = next;
                true
            }
            None => false,
        })
    }
}
