//! Stand-in for hosts without SetupAPI: every call fails.

use uuid::{uuid, Uuid};

use super::{DevicePlatform, DeviceRecord, EnumScope, PlatformError, RegistryProperty, StateChange};

/// Win32 `ERROR_CALL_NOT_IMPLEMENTED`.
const ERROR_CALL_NOT_IMPLEMENTED: u32 = 120;

#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

fn unsupported() -> PlatformError {
    PlatformError::new(ERROR_CALL_NOT_IMPLEMENTED, "device management requires Windows")
}

impl DevicePlatform for Unsupported {
    type Set = ();
    type Raw = ();

    fn hid_interface_class(&self) -> Uuid {
        uuid!("4d1e55b2-f16f-11cf-88cb-001111000030")
    }

    fn open_class_devices(&self, _class: Uuid, _scope: EnumScope) -> Result<(), PlatformError> {
        Err(unsupported())
    }

    fn enum_device(&self, _set: &(), _index: u32) -> Result<Option<DeviceRecord<()>>, PlatformError> {
        Err(unsupported())
    }

    fn string_property(
        &self,
        _set: &(),
        _record: &DeviceRecord<()>,
        _property: RegistryProperty,
    ) -> Result<String, PlatformError> {
        Err(unsupported())
    }

    fn set_property_change(
        &self,
        _set: &(),
        _record: &DeviceRecord<()>,
        _state: StateChange,
    ) -> Result<(), PlatformError> {
        Err(unsupported())
    }

    fn change_state(&self, _set: &(), _record: &mut DeviceRecord<()>) -> Result<(), PlatformError> {
        Err(unsupported())
    }

    fn destroy(&self, _set: &()) {}
}
