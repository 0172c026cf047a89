//! Device enumeration module
//!
//! Device identity, errors and the seam over the platform's device
//! management primitives. The SetupAPI implementation lives in `win32`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

mod controller;
#[cfg(test)]
pub(crate) mod fake;
mod matcher;
mod setupdienum;
#[cfg(not(windows))]
pub mod unsupported;
#[cfg(windows)]
pub mod win32;

pub use controller::set_enabled;
pub use matcher::{find_device, list_devices, MatchRule, TOUCHSCREEN_CLASS, TOUCHSCREEN_DRIVER_KEY};
pub use setupdienum::DeviceInfoSet;

/// Which devices a device information set is opened over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumScope {
    /// Devices exposing an interface of the class (DIGCF_DEVICEINTERFACE).
    DeviceInterface,
    /// Devices of the setup class that are currently present (DIGCF_PRESENT).
    Present,
}

/// Registry string properties read from a device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryProperty {
    Class,
    DeviceDesc,
    Driver,
    FriendlyName,
}

impl RegistryProperty {
    pub fn name(self) -> &'static str {
        match self {
            RegistryProperty::Class => "SPDRP_CLASS",
            RegistryProperty::DeviceDesc => "SPDRP_DEVICEDESC",
            RegistryProperty::Driver => "SPDRP_DRIVER",
            RegistryProperty::FriendlyName => "SPDRP_FRIENDLYNAME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Enable,
    Disable,
}

impl From<bool> for StateChange {
    fn from(enable: bool) -> Self {
        if enable {
            StateChange::Enable
        } else {
            StateChange::Disable
        }
    }
}

/// One entry of a device information set.
///
/// `raw` is whatever the platform needs to address the entry again
/// (an `SP_DEVINFO_DATA` on Windows); it is only meaningful while the set
/// that produced it is open.
#[derive(Debug, Clone, Copy)]
pub struct DeviceRecord<R> {
    pub instance_handle: u32,
    pub class_guid: Uuid,
    #[cfg_attr(not(windows), allow(dead_code))]
    pub raw: R,
}

/// Lookup key for a device: the instance handle is only valid inside an
/// enumeration of `class_guid`, so the pair has to be resolved again in a
/// fresh set before anything is done with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub class_guid: Uuid,
    pub instance_handle: u32,
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance {} of class {{{}}}", self.instance_handle, self.class_guid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub device_class: String,
    pub description: String,
    pub driver_name: String,
    pub instance_handle: u32,
    pub class_guid: Uuid,
}

impl DeviceInfo {
    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            class_guid: self.class_guid,
            instance_handle: self.instance_handle,
        }
    }

    /// Friendly name if the device has one, its description otherwise.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.description
        } else {
            &self.name
        }
    }
}

/// A failed platform call, with the platform's error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (error {code})")]
pub struct PlatformError {
    pub code: u32,
    pub message: String,
}

impl PlatformError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open device information set for class {{{class}}}: {source}")]
    EnvironmentUnavailable {
        class: Uuid,
        #[source]
        source: PlatformError,
    },

    #[error("device enumeration failed: {0}")]
    EnumerationFailed(#[source] PlatformError),

    #[error("device not present: {key}")]
    DeviceNotPresent { key: DeviceKey },

    #[error("cannot set device install parameters: {0}")]
    SetParamsFailed(#[source] PlatformError),

    #[error("cannot change device state: {0}")]
    StateChangeFailed(#[source] PlatformError),
}

impl DeviceError {
    /// Platform error code captured with this error, if any.
    pub fn code(&self) -> Option<u32> {
        match self {
            DeviceError::EnvironmentUnavailable { source, .. } => Some(source.code),
            DeviceError::EnumerationFailed(e)
            | DeviceError::SetParamsFailed(e)
            | DeviceError::StateChangeFailed(e) => Some(e.code),
            DeviceError::DeviceNotPresent { .. } => None,
        }
    }
}

/// The device management primitives this crate is built on.
///
/// Implementations do no matching or bookkeeping of their own; sets are
/// opened and destroyed through `DeviceInfoSet`, which pairs every
/// successful `open_class_devices` with exactly one `destroy`.
pub trait DevicePlatform {
    /// An open device information set.
    type Set;
    /// Per-record data needed to address a device inside its set.
    type Raw;

    /// Device interface class GUID for HID devices.
    fn hid_interface_class(&self) -> Uuid;

    fn open_class_devices(&self, class: Uuid, scope: EnumScope) -> Result<Self::Set, PlatformError>;

    /// Returns `Ok(None)` once `index` is past the last device.
    fn enum_device(
        &self,
        set: &Self::Set,
        index: u32,
    ) -> Result<Option<DeviceRecord<Self::Raw>>, PlatformError>;

    fn string_property(
        &self,
        set: &Self::Set,
        record: &DeviceRecord<Self::Raw>,
        property: RegistryProperty,
    ) -> Result<String, PlatformError>;

    /// Submit global-scope DIF_PROPERTYCHANGE install params for `record`.
    fn set_property_change(
        &self,
        set: &Self::Set,
        record: &DeviceRecord<Self::Raw>,
        state: StateChange,
    ) -> Result<(), PlatformError>;

    /// Apply the install params previously submitted for `record`.
    fn change_state(
        &self,
        set: &Self::Set,
        record: &mut DeviceRecord<Self::Raw>,
    ) -> Result<(), PlatformError>;

    fn destroy(&self, set: &Self::Set);
}

/// Strip the Win32 facility off an HRESULT, so `0x80070005` reads as `5`.
#[cfg(any(windows, test))]
pub(crate) fn win32_code(hresult: i32) -> u32 {
    let hresult = hresult as u32;
    if hresult & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

/// Decode a UTF-16LE REG_SZ buffer, stopping at the null terminator.
#[cfg(any(windows, test))]
pub(crate) fn string_from_utf16_bytes(buf: &[u8]) -> String {
    let wide: Vec<u16> = buf
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}
