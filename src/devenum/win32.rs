//! SetupAPI implementation of [`DevicePlatform`].

use core::mem::size_of;

use tracing::warn;
use uuid::Uuid;
use windows::{
    core::{GUID, PCWSTR},
    Win32::{
        Devices::{
            DeviceAndDriverInstallation::{
                SetupDiChangeState, SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo,
                SetupDiGetClassDevsW, SetupDiGetDeviceRegistryPropertyW, SetupDiSetClassInstallParamsW,
                DICS_DISABLE, DICS_ENABLE, DICS_FLAG_GLOBAL, DIF_PROPERTYCHANGE, DIGCF_DEVICEINTERFACE,
                DIGCF_PRESENT, HDEVINFO, SETUP_DI_REGISTRY_PROPERTY, SPDRP_CLASS, SPDRP_DEVICEDESC,
                SPDRP_DRIVER, SPDRP_FRIENDLYNAME, SP_CLASSINSTALL_HEADER, SP_DEVINFO_DATA,
                SP_PROPCHANGE_PARAMS,
            },
            HumanInterfaceDevice::HidD_GetHidGuid,
        },
        Foundation::{ERROR_INSUFFICIENT_BUFFER, ERROR_NO_MORE_ITEMS, HWND},
    },
};

use super::{
    string_from_utf16_bytes, win32_code, DevicePlatform, DeviceRecord, EnumScope, PlatformError,
    RegistryProperty, StateChange,
};

impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> PlatformError {
        PlatformError::new(win32_code(err.code().0), err.message().to_string())
    }
}

/// The Windows device installer (setupapi.dll).
#[derive(Debug, Default, Clone, Copy)]
pub struct SetupApi;

impl DevicePlatform for SetupApi {
    type Set = HDEVINFO;
    type Raw = SP_DEVINFO_DATA;

    fn hid_interface_class(&self) -> Uuid {
        unsafe { uuid_from_guid(&HidD_GetHidGuid()) }
    }

    fn open_class_devices(&self, class: Uuid, scope: EnumScope) -> Result<HDEVINFO, PlatformError> {
        let guid = guid_from_uuid(class);
        let flags = match scope {
            EnumScope::DeviceInterface => DIGCF_DEVICEINTERFACE,
            EnumScope::Present => DIGCF_PRESENT,
        };
        let devinfo = unsafe { SetupDiGetClassDevsW(Some(&guid), PCWSTR::null(), HWND::default(), flags)? };
        Ok(devinfo)
    }

    fn enum_device(
        &self,
        set: &HDEVINFO,
        index: u32,
    ) -> Result<Option<DeviceRecord<SP_DEVINFO_DATA>>, PlatformError> {
        let mut data = SP_DEVINFO_DATA {
            cbSize: size_of::<SP_DEVINFO_DATA>() as u32,
            ..Default::default()
        };
        match unsafe { SetupDiEnumDeviceInfo(*set, index, &mut data) } {
            Ok(()) => Ok(Some(DeviceRecord {
                instance_handle: data.DevInst,
                class_guid: uuid_from_guid(&data.ClassGuid),
                raw: data,
            })),
            Err(err) if err.code() == ERROR_NO_MORE_ITEMS.into() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn string_property(
        &self,
        set: &HDEVINFO,
        record: &DeviceRecord<SP_DEVINFO_DATA>,
        property: RegistryProperty,
    ) -> Result<String, PlatformError> {
        let prop = registry_property(property);
        unsafe {
            let buflen = prop_bufsize(*set, &record.raw, prop)?;
            let mut buf = vec![0u8; buflen as usize];
            SetupDiGetDeviceRegistryPropertyW(*set, &record.raw, prop, None, Some(&mut buf), None)?;
            Ok(string_from_utf16_bytes(&buf))
        }
    }

    fn set_property_change(
        &self,
        set: &HDEVINFO,
        record: &DeviceRecord<SP_DEVINFO_DATA>,
        state: StateChange,
    ) -> Result<(), PlatformError> {
        let params = SP_PROPCHANGE_PARAMS {
            ClassInstallHeader: SP_CLASSINSTALL_HEADER {
                cbSize: size_of::<SP_CLASSINSTALL_HEADER>() as u32,
                InstallFunction: DIF_PROPERTYCHANGE,
            },
            StateChange: match state {
                StateChange::Enable => DICS_ENABLE,
                StateChange::Disable => DICS_DISABLE,
            },
            Scope: DICS_FLAG_GLOBAL,
            HwProfile: 0,
        };
        unsafe {
            SetupDiSetClassInstallParamsW(
                *set,
                Some(&record.raw),
                Some(&params.ClassInstallHeader),
                size_of::<SP_PROPCHANGE_PARAMS>() as u32,
            )?;
        }
        Ok(())
    }

    fn change_state(
        &self,
        set: &HDEVINFO,
        record: &mut DeviceRecord<SP_DEVINFO_DATA>,
    ) -> Result<(), PlatformError> {
        unsafe { SetupDiChangeState(*set, &mut record.raw)? };
        Ok(())
    }

    fn destroy(&self, set: &HDEVINFO) {
        if let Err(err) = unsafe { SetupDiDestroyDeviceInfoList(*set) } {
            warn!(%err, "cannot destroy device information set");
        }
    }
}

fn registry_property(property: RegistryProperty) -> SETUP_DI_REGISTRY_PROPERTY {
    match property {
        RegistryProperty::Class => SPDRP_CLASS,
        RegistryProperty::DeviceDesc => SPDRP_DEVICEDESC,
        RegistryProperty::Driver => SPDRP_DRIVER,
        RegistryProperty::FriendlyName => SPDRP_FRIENDLYNAME,
    }
}

/// Query required buffer size
unsafe fn prop_bufsize(
    devinfo: HDEVINFO,
    devinfo_data: &SP_DEVINFO_DATA,
    prop: SETUP_DI_REGISTRY_PROPERTY,
) -> Result<u32, PlatformError> {
    let mut buflen = 0;
    // a null buffer makes this fail with ERROR_INSUFFICIENT_BUFFER and the size filled in;
    // ERROR_INVALID_DATA means the device doesn't have the property
    match SetupDiGetDeviceRegistryPropertyW(devinfo, devinfo_data, prop, None, None, Some(&mut buflen)) {
        Ok(()) => Ok(buflen),
        Err(err) if err.code() == ERROR_INSUFFICIENT_BUFFER.into() => Ok(buflen),
        Err(err) => Err(err.into()),
    }
}

fn guid_from_uuid(uuid: Uuid) -> GUID {
    let (data1, data2, data3, data4) = uuid.as_fields();
    GUID::from_values(data1, data2, data3, *data4)
}

fn uuid_from_guid(guid: &GUID) -> Uuid {
    Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
}
