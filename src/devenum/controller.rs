use tracing::{debug, info};

use super::{DeviceError, DeviceInfoSet, DeviceKey, DevicePlatform, DeviceRecord, EnumScope, StateChange};

/// Set the device behind `key` enabled or disabled.
///
/// The key is resolved again in a fresh set of the present devices of its
/// class; a handle from an earlier enumeration is never acted on directly.
/// Setting a device to the state it is already in succeeds.
pub fn set_enabled<P: DevicePlatform>(
    platform: &P,
    key: DeviceKey,
    enable: bool,
) -> Result<(), DeviceError> {
    let state = StateChange::from(enable);
    let devinfo = DeviceInfoSet::open(platform, key.class_guid, EnumScope::Present)
        .map_err(DeviceError::EnumerationFailed)?;

    let mut record = find_present(&devinfo, key)?.ok_or(DeviceError::DeviceNotPresent { key })?;
    debug!(%key, ?state, "device is present, changing state");

    devinfo
        .set_property_change(&record, state)
        .map_err(DeviceError::SetParamsFailed)?;
    devinfo
        .change_state(&mut record)
        .map_err(DeviceError::StateChangeFailed)?;

    info!(%key, ?state, "device state changed");
    Ok(())
}

fn find_present<P: DevicePlatform>(
    devinfo: &DeviceInfoSet<'_, P>,
    key: DeviceKey,
) -> Result<Option<DeviceRecord<P::Raw>>, DeviceError> {
    for record in devinfo.iter() {
        let record = record.map_err(DeviceError::EnumerationFailed)?;
        if record.instance_handle == key.instance_handle {
            return Ok(Some(record));
        }
    }
    Ok(None)
}
