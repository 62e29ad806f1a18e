//! Device Module
//!
//! Input device registry: the core pointer is always present, extension
//! devices (tablets, pens, erasers) are added by the backend and only
//! report events while enabled.

use tracing::{debug, info, warn};

use crate::events::DeviceId;

/// Device id of the core pointer
pub const CORE_POINTER: DeviceId = 2;

/// Input device
#[derive(Debug, Clone, PartialEq)]
pub struct InputDevice {
    /// Device ID
    pub id: DeviceId,

    /// Device name
    pub name: String,

    /// Kind of hardware behind the device
    pub source: InputSource,

    /// Reporting mode
    pub mode: InputMode,

    /// Device drives the visible cursor
    pub has_cursor: bool,

    /// Number of valuators
    pub num_axes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Pen,
    Eraser,
    Cursor,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Disabled,
    /// Coordinates map to the whole screen
    Screen,
    /// Coordinates map to the window under the device
    Window,
}

/// Device registry
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Vec<InputDevice>,
}

impl DeviceRegistry {
    /// Create a registry holding only the core pointer
    pub fn new() -> Self {
        Self {
            devices: vec![InputDevice {
                id: CORE_POINTER,
                name: "Core Pointer".to_string(),
                source: InputSource::Mouse,
                mode: InputMode::Screen,
                has_cursor: true,
                num_axes: 2,
            }],
        }
    }

    /// Add an extension device; extension devices start disabled
    pub fn add_device(&mut self, id: DeviceId, name: &str, source: InputSource, num_axes: u32) -> bool {
        if self.lookup(id).is_some() {
            warn!("Input device {} already registered", id);
            return false;
        }
        info!("Input device {} added: {} ({:?})", id, name, source);
        self.devices.push(InputDevice {
            id,
            name: name.to_string(),
            source,
            mode: InputMode::Disabled,
            has_cursor: false,
            num_axes,
        });
        true
    }

    pub fn remove_device(&mut self, id: DeviceId) -> Option<InputDevice> {
        if id == CORE_POINTER {
            warn!("The core pointer cannot be removed");
            return None;
        }
        let index = self.devices.iter().position(|device| device.id == id)?;
        debug!("Input device {} removed", id);
        Some(self.devices.remove(index))
    }

    pub fn lookup(&self, id: DeviceId) -> Option<&InputDevice> {
        self.devices.iter().find(|device| device.id == id)
    }

    /// Change a device's reporting mode
    pub fn set_mode(&mut self, id: DeviceId, mode: InputMode) -> bool {
        if id == CORE_POINTER && mode == InputMode::Disabled {
            warn!("The core pointer cannot be disabled");
            return false;
        }
        match self.devices.iter_mut().find(|device| device.id == id) {
            Some(device) => {
                debug!("Input device {} mode {:?} -> {:?}", id, device.mode, mode);
                device.mode = mode;
                true
            }
            None => false,
        }
    }

    /// Whether events from `id` should be reported at all
    pub fn is_reporting(&self, id: DeviceId) -> bool {
        self.lookup(id)
            .is_some_and(|device| device.mode != InputMode::Disabled)
    }

    pub fn core_pointer(&self) -> Option<&InputDevice> {
        self.lookup(CORE_POINTER)
    }

    /// Get device list
    pub fn devices(&self) -> &[InputDevice] {
        &self.devices
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
