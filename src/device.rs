use alloc::string::String;
use alloc::vec::Vec;

use crate::blob::nul_terminated;
use crate::caps::{Capability, ClientCap, DeviceCap};
use crate::ioctl;
use crate::query::{self, ArrayRequest, QueryConfig};
use crate::result::Error;

/// Raw access to the kernel requests this crate makes.
///
/// Each `*_raw` method issues exactly one request, with `arg` passed to the
/// kernel as-is and updated with whatever the kernel writes back. Any array
/// pointers in `arg` must already point to buffers of the capacities given
/// alongside them.
///
/// [`crate::Card`] implements this trait for a real device. The higher-level
/// queries of [`crate::modeset::ModesetDevice`] are available on any
/// implementation.
pub trait DrmDevice {
    fn version_raw(&self, arg: &mut ioctl::DrmVersion) -> Result<(), Error>;
    fn get_cap_raw(&self, arg: &mut ioctl::DrmGetCap) -> Result<(), Error>;
    fn set_client_cap_raw(&self, arg: &ioctl::DrmSetClientCap) -> Result<(), Error>;
    fn get_resources_raw(&self, arg: &mut ioctl::DrmModeCardRes) -> Result<(), Error>;
    fn get_crtc_raw(&self, arg: &mut ioctl::DrmModeCrtc) -> Result<(), Error>;
    fn get_encoder_raw(&self, arg: &mut ioctl::DrmModeGetEncoder) -> Result<(), Error>;
    fn get_connector_raw(&self, arg: &mut ioctl::DrmModeGetConnector) -> Result<(), Error>;
    fn get_plane_resources_raw(&self, arg: &mut ioctl::DrmModeGetPlaneRes) -> Result<(), Error>;
    fn get_plane_raw(&self, arg: &mut ioctl::DrmModeGetPlane) -> Result<(), Error>;
    fn obj_get_properties_raw(&self, arg: &mut ioctl::DrmModeObjGetProperties) -> Result<(), Error>;
    fn get_property_raw(&self, arg: &mut ioctl::DrmModeGetProperty) -> Result<(), Error>;
    fn get_blob_raw(&self, arg: &mut ioctl::DrmModeGetBlob) -> Result<(), Error>;

    /// Limits for queries that return arrays.
    fn query_config(&self) -> QueryConfig {
        QueryConfig::default()
    }

    /// The name, date, description and version number of the driver.
    fn driver_version(&self) -> Result<DriverVersion, Error> {
        let (raw, [name, date, desc]) = query::fetch(
            &self.query_config(),
            &ioctl::DrmVersion::zeroed(),
            |r| self.version_raw(r),
        )?;
        Ok(DriverVersion {
            major: raw.version_major,
            minor: raw.version_minor,
            patch: raw.version_patchlevel,
            name: nul_terminated(&name),
            date: nul_terminated(&date),
            desc: nul_terminated(&desc),
        })
    }

    fn device_cap(&self, cap: DeviceCap) -> Result<Capability<u64>, Error> {
        let mut arg = ioctl::DrmGetCap::zeroed();
        arg.capability = cap.as_raw();
        match self.get_cap_raw(&mut arg) {
            Ok(()) => Ok(Capability::Supported(arg.value)),
            Err(Error::Invalid) => Ok(Capability::Unsupported),
            Err(e) => Err(e),
        }
    }

    /// Ask the kernel to enable or disable a client capability for this
    /// file description.
    fn set_client_cap(&self, cap: ClientCap, value: u64) -> Result<Capability<()>, Error> {
        let mut arg = ioctl::DrmSetClientCap::zeroed();
        arg.capability = cap.as_raw();
        arg.value = value;
        match self.set_client_cap_raw(&arg) {
            Ok(()) => Ok(Capability::Supported(())),
            Err(Error::Invalid) => Ok(Capability::Unsupported),
            Err(e) => Err(e),
        }
    }
}

impl<T: DrmDevice + ?Sized> DrmDevice for &T {
    fn version_raw(&self, arg: &mut ioctl::DrmVersion) -> Result<(), Error> {
        (**self).version_raw(arg)
    }
    fn get_cap_raw(&self, arg: &mut ioctl::DrmGetCap) -> Result<(), Error> {
        (**self).get_cap_raw(arg)
    }
    fn set_client_cap_raw(&self, arg: &ioctl::DrmSetClientCap) -> Result<(), Error> {
        (**self).set_client_cap_raw(arg)
    }
    fn get_resources_raw(&self, arg: &mut ioctl::DrmModeCardRes) -> Result<(), Error> {
        (**self).get_resources_raw(arg)
    }
    fn get_crtc_raw(&self, arg: &mut ioctl::DrmModeCrtc) -> Result<(), Error> {
        (**self).get_crtc_raw(arg)
    }
    fn get_encoder_raw(&self, arg: &mut ioctl::DrmModeGetEncoder) -> Result<(), Error> {
        (**self).get_encoder_raw(arg)
    }
    fn get_connector_raw(&self, arg: &mut ioctl::DrmModeGetConnector) -> Result<(), Error> {
        (**self).get_connector_raw(arg)
    }
    fn get_plane_resources_raw(&self, arg: &mut ioctl::DrmModeGetPlaneRes) -> Result<(), Error> {
        (**self).get_plane_resources_raw(arg)
    }
    fn get_plane_raw(&self, arg: &mut ioctl::DrmModeGetPlane) -> Result<(), Error> {
        (**self).get_plane_raw(arg)
    }
    fn obj_get_properties_raw(
        &self,
        arg: &mut ioctl::DrmModeObjGetProperties,
    ) -> Result<(), Error> {
        (**self).obj_get_properties_raw(arg)
    }
    fn get_property_raw(&self, arg: &mut ioctl::DrmModeGetProperty) -> Result<(), Error> {
        (**self).get_property_raw(arg)
    }
    fn get_blob_raw(&self, arg: &mut ioctl::DrmModeGetBlob) -> Result<(), Error> {
        (**self).get_blob_raw(arg)
    }
    fn query_config(&self) -> QueryConfig {
        (**self).query_config()
    }
}

/// Identification of the kernel driver behind a card.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriverVersion {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub name: String,
    pub date: String,
    pub desc: String,
}

impl core::fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Self {
            major,
            minor,
            patch,
            date,
            ..
        } = self;
        write!(f, "{major}.{minor}.{patch} ({date})")
    }
}

fn byte_buffer(len: usize) -> Result<Vec<u8>, Error> {
    let mut ret = Vec::new();
    ret.try_reserve_exact(len)?;
    ret.resize(len, 0);
    Ok(ret)
}

impl ArrayRequest for ioctl::DrmVersion {
    type Lengths = [usize; 3];
    type Buffers = [Vec<u8>; 3];

    fn sizing(&self) -> Self {
        Self::zeroed()
    }

    fn lengths(&self) -> [usize; 3] {
        [self.name_len(), self.date_len(), self.desc_len()]
    }

    fn allocate(&self) -> Result<[Vec<u8>; 3], Error> {
        Ok([
            byte_buffer(self.name_len())?,
            byte_buffer(self.date_len())?,
            byte_buffer(self.desc_len())?,
        ])
    }

    unsafe fn attach(&mut self, [name, date, desc]: &mut [Vec<u8>; 3]) {
        self.set_name_ptr(name.as_mut_ptr(), name.len());
        self.set_date_ptr(date.as_mut_ptr(), date.len());
        self.set_desc_ptr(desc.as_mut_ptr(), desc.len());
    }
}
