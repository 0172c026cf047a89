use tracing::{debug, info, trace, warn};

use super::{
    DeviceError, DeviceInfo, DeviceInfoSet, DevicePlatform, DeviceRecord, EnumScope, RegistryProperty,
};

/// Setup class name reported for HID devices.
pub const TOUCHSCREEN_CLASS: &str = "HIDClass";

/// Driver key of the HID-compliant touch screen binding.
pub const TOUCHSCREEN_DRIVER_KEY: &str = r"{745a17a0-74d3-11d0-b6fe-00a0c90f57da}\0012";

/// Predicate deciding which enumerated device is the target.
///
/// Class and driver key are compared exactly. The description check is
/// off unless a description is given, so by default any `HIDClass` device
/// bound to `driver_key` matches whatever it calls itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub device_class: String,
    pub driver_key: String,
    pub description: Option<String>,
}

impl MatchRule {
    pub fn touchscreen() -> Self {
        MatchRule {
            device_class: TOUCHSCREEN_CLASS.into(),
            driver_key: TOUCHSCREEN_DRIVER_KEY.into(),
            description: None,
        }
    }

    pub fn is_match(&self, device: &DeviceInfo) -> bool {
        device.device_class == self.device_class
            && self
                .description
                .as_ref()
                .map_or(true, |d| *d == device.description)
            && device.driver_name == self.driver_key
    }
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule::touchscreen()
    }
}

/// Find the first HID device satisfying `rule`, in enumeration order.
///
/// `Ok(None)` means every device was looked at and none matched. Failing
/// to open the HID device set is [`DeviceError::EnvironmentUnavailable`].
pub fn find_device<P: DevicePlatform>(
    platform: &P,
    rule: &MatchRule,
) -> Result<Option<DeviceInfo>, DeviceError> {
    let devinfo = open_hid(platform)?;
    for record in devinfo.iter() {
        let record = record.map_err(DeviceError::EnumerationFailed)?;
        let device = read_device_info(&devinfo, &record);
        if rule.is_match(&device) {
            info!(
                instance = device.instance_handle,
                class_guid = %device.class_guid,
                description = %device.description,
                "matched device"
            );
            return Ok(Some(device));
        }
        trace!(instance = device.instance_handle, "device does not match");
    }
    debug!(?rule, "no device matched");
    Ok(None)
}

/// Every HID device with its properties, in enumeration order.
pub fn list_devices<P: DevicePlatform>(platform: &P) -> Result<Vec<DeviceInfo>, DeviceError> {
    let devinfo = open_hid(platform)?;
    let mut devices = Vec::new();
    for record in devinfo.iter() {
        let record = record.map_err(DeviceError::EnumerationFailed)?;
        devices.push(read_device_info(&devinfo, &record));
    }
    Ok(devices)
}

fn open_hid<P: DevicePlatform>(platform: &P) -> Result<DeviceInfoSet<'_, P>, DeviceError> {
    let class = platform.hid_interface_class();
    DeviceInfoSet::open(platform, class, EnumScope::DeviceInterface)
        .map_err(|source| DeviceError::EnvironmentUnavailable { class, source })
}

/// Read the properties of one record. A property that can't be read is
/// left empty.
fn read_device_info<P: DevicePlatform>(
    devinfo: &DeviceInfoSet<'_, P>,
    record: &DeviceRecord<P::Raw>,
) -> DeviceInfo {
    let read = |property: RegistryProperty| {
        devinfo
            .string_property(record, property)
            .unwrap_or_else(|err| {
                warn!(
                    instance = record.instance_handle,
                    property = property.name(),
                    %err,
                    "cannot read device property"
                );
                String::new()
            })
    };
    let device_class = read(RegistryProperty::Class);
    let description = read(RegistryProperty::DeviceDesc);
    let driver_name = read(RegistryProperty::Driver);

    // most devices have no friendly name
    let name = devinfo
        .string_property(record, RegistryProperty::FriendlyName)
        .unwrap_or_default();

    debug!(
        instance = record.instance_handle,
        class = %device_class,
        description = %description,
        driver = %driver_name,
        "inspected device"
    );
    DeviceInfo {
        name,
        device_class,
        description,
        driver_name,
        instance_handle: record.instance_handle,
        class_guid: record.class_guid,
    }
}
