//! In-memory device platform for tests.

use std::cell::{Cell, RefCell};

use uuid::{uuid, Uuid};

use super::{DevicePlatform, DeviceRecord, EnumScope, PlatformError, RegistryProperty, StateChange};

pub const HID_INTERFACE_GUID: Uuid = uuid!("4d1e55b2-f16f-11cf-88cb-001111000030");
pub const HIDCLASS_GUID: Uuid = uuid!("745a17a0-74d3-11d0-b6fe-00a0c90f57da");
pub const USB_GUID: Uuid = uuid!("36fc9e60-c465-11cf-8056-444553540000");

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub instance: u32,
    pub class_guid: Uuid,
    pub class: String,
    pub description: String,
    pub driver: String,
    pub friendly_name: Option<String>,
    pub present: bool,
    pub enabled: bool,
}

impl FakeDevice {
    pub fn new(instance: u32, class: &str, driver: &str) -> Self {
        FakeDevice {
            instance,
            class_guid: if class == "HIDClass" { HIDCLASS_GUID } else { USB_GUID },
            class: class.into(),
            description: format!("device {instance}"),
            driver: driver.into(),
            friendly_name: None,
            present: true,
            enabled: false,
        }
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }
}

/// Set handles are snapshots of the device list indexes they cover.
pub struct FakeSet(Vec<usize>);

#[derive(Default)]
pub struct FakePlatform {
    devices: RefCell<Vec<FakeDevice>>,
    opens: Cell<u32>,
    closes: Cell<u32>,
    inspected: RefCell<Vec<u32>>,
    pending: RefCell<Option<(u32, StateChange)>>,
    changes: RefCell<Vec<(u32, StateChange)>>,
    missing: RefCell<Vec<(u32, RegistryProperty)>>,
    fail_open: RefCell<Option<(EnumScope, PlatformError)>>,
    fail_enum: RefCell<Option<(u32, PlatformError)>>,
    fail_set_params: RefCell<Option<PlatformError>>,
    fail_change_state: RefCell<Option<PlatformError>>,
}

impl FakePlatform {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        FakePlatform {
            devices: RefCell::new(devices),
            ..Default::default()
        }
    }

    pub fn opens(&self) -> u32 {
        self.opens.get()
    }

    pub fn closes(&self) -> u32 {
        self.closes.get()
    }

    /// Instance handles whose properties were read, in order.
    pub fn inspected(&self) -> Vec<u32> {
        self.inspected.borrow().clone()
    }

    pub fn changes(&self) -> Vec<(u32, StateChange)> {
        self.changes.borrow().clone()
    }

    pub fn is_enabled(&self, instance: u32) -> bool {
        self.devices
            .borrow()
            .iter()
            .any(|d| d.instance == instance && d.enabled)
    }

    pub fn unplug(&self, instance: u32) {
        for device in self.devices.borrow_mut().iter_mut() {
            if device.instance == instance {
                device.present = false;
            }
        }
    }

    pub fn drop_property(&self, instance: u32, property: RegistryProperty) {
        self.missing.borrow_mut().push((instance, property));
    }

    pub fn fail_open(&self, scope: EnumScope, err: PlatformError) {
        *self.fail_open.borrow_mut() = Some((scope, err));
    }

    pub fn fail_enum_at(&self, index: u32, err: PlatformError) {
        *self.fail_enum.borrow_mut() = Some((index, err));
    }

    pub fn fail_set_params(&self, err: PlatformError) {
        *self.fail_set_params.borrow_mut() = Some(err);
    }

    pub fn fail_change_state(&self, err: PlatformError) {
        *self.fail_change_state.borrow_mut() = Some(err);
    }

    fn device(&self, instance: u32) -> Option<FakeDevice> {
        self.devices
            .borrow()
            .iter()
            .find(|d| d.instance == instance)
            .cloned()
    }
}

impl DevicePlatform for FakePlatform {
    type Set = FakeSet;
    type Raw = ();

    fn hid_interface_class(&self) -> Uuid {
        HID_INTERFACE_GUID
    }

    fn open_class_devices(&self, class: Uuid, scope: EnumScope) -> Result<FakeSet, PlatformError> {
        if let Some((failing, err)) = self.fail_open.borrow().as_ref() {
            if *failing == scope {
                return Err(err.clone());
            }
        }
        let devices = self.devices.borrow();
        let members = devices
            .iter()
            .enumerate()
            .filter(|(_, d)| match scope {
                EnumScope::DeviceInterface => class == HID_INTERFACE_GUID,
                EnumScope::Present => d.present && d.class_guid == class,
            })
            .map(|(i, _)| i)
            .collect();
        self.opens.set(self.opens.get() + 1);
        Ok(FakeSet(members))
    }

    fn enum_device(&self, set: &FakeSet, index: u32) -> Result<Option<DeviceRecord<()>>, PlatformError> {
        if let Some((failing, err)) = self.fail_enum.borrow().as_ref() {
            if *failing == index {
                return Err(err.clone());
            }
        }
        let devices = self.devices.borrow();
        Ok(set.0.get(index as usize).map(|&i| DeviceRecord {
            instance_handle: devices[i].instance,
            class_guid: devices[i].class_guid,
            raw: (),
        }))
    }

    fn string_property(
        &self,
        _set: &FakeSet,
        record: &DeviceRecord<()>,
        property: RegistryProperty,
    ) -> Result<String, PlatformError> {
        let instance = record.instance_handle;
        {
            let mut inspected = self.inspected.borrow_mut();
            if inspected.last() != Some(&instance) {
                inspected.push(instance);
            }
        }
        if self.missing.borrow().contains(&(instance, property)) {
            return Err(PlatformError::new(13, "The data is invalid."));
        }
        let device = self
            .device(instance)
            .ok_or_else(|| PlatformError::new(0xE000_020B, "no such device instance"))?;
        match property {
            RegistryProperty::Class => Ok(device.class),
            RegistryProperty::DeviceDesc => Ok(device.description),
            RegistryProperty::Driver => Ok(device.driver),
            RegistryProperty::FriendlyName => device
                .friendly_name
                .ok_or_else(|| PlatformError::new(13, "The data is invalid.")),
        }
    }

    fn set_property_change(
        &self,
        _set: &FakeSet,
        record: &DeviceRecord<()>,
        state: StateChange,
    ) -> Result<(), PlatformError> {
        if let Some(err) = self.fail_set_params.borrow().clone() {
            return Err(err);
        }
        *self.pending.borrow_mut() = Some((record.instance_handle, state));
        Ok(())
    }

    fn change_state(&self, _set: &FakeSet, record: &mut DeviceRecord<()>) -> Result<(), PlatformError> {
        if let Some(err) = self.fail_change_state.borrow().clone() {
            return Err(err);
        }
        let (instance, state) = self
            .pending
            .borrow_mut()
            .take()
            .filter(|(instance, _)| *instance == record.instance_handle)
            .ok_or_else(|| PlatformError::new(0xE000_0217, "no class install params"))?;
        for device in self.devices.borrow_mut().iter_mut() {
            if device.instance == instance {
                device.enabled = state == StateChange::Enable;
            }
        }
        self.changes.borrow_mut().push((instance, state));
        Ok(())
    }

    fn destroy(&self, _set: &FakeSet) {
        self.closes.set(self.closes.get() + 1);
    }
}
