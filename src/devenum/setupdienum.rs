use core::iter::FusedIterator;

use tracing::trace;
use uuid::Uuid;

use super::{DevicePlatform, DeviceRecord, EnumScope, PlatformError, RegistryProperty, StateChange};

/// An open device information set, destroyed when dropped.
///
/// Records handed out by [`DeviceInfoSet::iter`] borrow the set, so none of
/// them can be used after the set is gone.
pub struct DeviceInfoSet<'p, P: DevicePlatform> {
    platform: &'p P,
    devinfo: P::Set,
    class: Uuid,
}

impl<'p, P: DevicePlatform> DeviceInfoSet<'p, P> {
    pub fn open(platform: &'p P, class: Uuid, scope: EnumScope) -> Result<Self, PlatformError> {
        let devinfo = platform.open_class_devices(class, scope)?;
        trace!(%class, ?scope, "opened device information set");
        Ok(DeviceInfoSet {
            platform,
            devinfo,
            class,
        })
    }

    /// Walk the set from index 0; every call starts over.
    pub fn iter(&self) -> SetupDiEnum<'_, P> {
        SetupDiEnum {
            set: self,
            index: 0,
            done: false,
        }
    }

    pub fn string_property(
        &self,
        record: &DeviceRecord<P::Raw>,
        property: RegistryProperty,
    ) -> Result<String, PlatformError> {
        self.platform.string_property(&self.devinfo, record, property)
    }

    pub fn set_property_change(
        &self,
        record: &DeviceRecord<P::Raw>,
        state: StateChange,
    ) -> Result<(), PlatformError> {
        self.platform.set_property_change(&self.devinfo, record, state)
    }

    pub fn change_state(&self, record: &mut DeviceRecord<P::Raw>) -> Result<(), PlatformError> {
        self.platform.change_state(&self.devinfo, record)
    }
}

impl<P: DevicePlatform> Drop for DeviceInfoSet<'_, P> {
    fn drop(&mut self) {
        self.platform.destroy(&self.devinfo);
        trace!(class = %self.class, "destroyed device information set");
    }
}

/// Lazy walk over a [`DeviceInfoSet`] by member index.
///
/// Ends at the platform's end-of-enumeration signal. Any other failure is
/// yielded once as an error and ends the walk.
pub struct SetupDiEnum<'s, P: DevicePlatform> {
    set: &'s DeviceInfoSet<'s, P>,
    index: u32,
    done: bool,
}

impl<P: DevicePlatform> Iterator for SetupDiEnum<'_, P> {
    type Item = Result<DeviceRecord<P::Raw>, PlatformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.set.platform.enum_device(&self.set.devinfo, self.index) {
            Ok(Some(record)) => {
                self.index += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<P: DevicePlatform> FusedIterator for SetupDiEnum<'_, P> {}
