use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    config::{LocationConfig, PermissionSetting},
    location::DeviceSettings,
};

/// Device settings backed by the user's configuration, with the permission
/// flag updatable at runtime once the user answers a prompt.
#[derive(Debug)]
pub struct ConfiguredDevice {
    permission: AtomicBool,
    enabled: AtomicBool,
}

impl ConfiguredDevice {
    pub fn new(permission: bool, enabled: bool) -> Self {
        Self {
            permission: AtomicBool::new(permission),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(config.permission == PermissionSetting::Granted, config.enabled)
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_location_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl DeviceSettings for ConfiguredDevice {
    fn has_location_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn is_location_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
