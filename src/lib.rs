//! Read-only queries against Linux Direct Rendering Manager (DRM) card
//! devices: modesetting resources, object properties and property blobs.
//!
//! Open a card with [`Card::open`], then use the methods of
//! [`modeset::ModesetDevice`] and [`device::DrmDevice`] to inspect it.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod blob;
pub mod caps;
pub mod device;
pub mod format;
/// Low-level `ioctl`-based access to DRM devices.
pub mod ioctl;
pub mod modeset;
pub mod pci;
pub mod query;
pub mod result;

#[cfg(test)]
mod testing;

pub use caps::{Capability, ClientCap, DeviceCap};
pub use device::{DriverVersion, DrmDevice};
pub use modeset::ModesetDevice;
pub use query::QueryConfig;
pub use result::{Error, InitError};

/// An open DRM card device.
pub struct Card {
    f: linux_io::File<ioctl::DrmCardDevice>,
    config: QueryConfig,
}

impl Card {
    pub fn open(path: &core::ffi::CStr) -> Result<Self, InitError> {
        let f = linux_io::File::open(path, linux_io::OpenOptions::read_write())?;
        Self::from_file(f)
    }

    pub fn from_file<D>(f: linux_io::File<D>) -> Result<Self, InitError> {
        // The VERSION request is supported by every DRM card, and fails
        // with ENOTTY on anything else.
        // Safety: the file is only returned as a card if the version check succeeds.
        let f: linux_io::File<ioctl::DrmCardDevice> = unsafe { f.to_device(ioctl::DrmCardDevice) };
        let mut v = ioctl::DrmVersion::zeroed();
        f.ioctl(ioctl::DRM_IOCTL_VERSION, &mut v)?;
        Ok(Self {
            f,
            config: QueryConfig::default(),
        })
    }

    /// # Safety
    ///
    /// `f` must be a DRM card device.
    pub unsafe fn from_file_unchecked<D>(f: linux_io::File<D>) -> Self {
        let f: linux_io::File<ioctl::DrmCardDevice> = unsafe { f.to_device(ioctl::DrmCardDevice) };
        Self {
            f,
            config: QueryConfig::default(),
        }
    }

    /// Replace the limits used by queries that return arrays.
    pub fn set_query_config(&mut self, config: QueryConfig) {
        self.config = config;
    }

    pub fn close(self) -> linux_io::result::Result<()> {
        let f = self.take_file();
        f.close()
    }

    pub fn take_file(self) -> linux_io::File<ioctl::DrmCardDevice> {
        self.f
    }

    pub fn borrow_file(&self) -> &linux_io::File<ioctl::DrmCardDevice> {
        &self.f
    }
}

impl DrmDevice for Card {
    fn version_raw(&self, arg: &mut ioctl::DrmVersion) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_VERSION, arg)?;
        Ok(())
    }

    fn get_cap_raw(&self, arg: &mut ioctl::DrmGetCap) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_GET_CAP, arg)?;
        Ok(())
    }

    fn set_client_cap_raw(&self, arg: &ioctl::DrmSetClientCap) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_SET_CLIENT_CAP, arg)?;
        Ok(())
    }

    fn get_resources_raw(&self, arg: &mut ioctl::DrmModeCardRes) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETRESOURCES, arg)?;
        Ok(())
    }

    fn get_crtc_raw(&self, arg: &mut ioctl::DrmModeCrtc) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETCRTC, arg)?;
        Ok(())
    }

    fn get_encoder_raw(&self, arg: &mut ioctl::DrmModeGetEncoder) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETENCODER, arg)?;
        Ok(())
    }

    fn get_connector_raw(&self, arg: &mut ioctl::DrmModeGetConnector) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETCONNECTOR, arg)?;
        Ok(())
    }

    fn get_plane_resources_raw(&self, arg: &mut ioctl::DrmModeGetPlaneRes) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETPLANERESOURCES, arg)?;
        Ok(())
    }

    fn get_plane_raw(&self, arg: &mut ioctl::DrmModeGetPlane) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETPLANE, arg)?;
        Ok(())
    }

    fn obj_get_properties_raw(
        &self,
        arg: &mut ioctl::DrmModeObjGetProperties,
    ) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_OBJ_GETPROPERTIES, arg)?;
        Ok(())
    }

    fn get_property_raw(&self, arg: &mut ioctl::DrmModeGetProperty) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETPROPERTY, arg)?;
        Ok(())
    }

    fn get_blob_raw(&self, arg: &mut ioctl::DrmModeGetBlob) -> Result<(), Error> {
        self.f.ioctl(ioctl::DRM_IOCTL_MODE_GETPROPBLOB, arg)?;
        Ok(())
    }

    fn query_config(&self) -> QueryConfig {
        self.config
    }
}

impl<D> TryFrom<linux_io::File<D>> for Card {
    type Error = InitError;

    #[inline(always)]
    fn try_from(value: linux_io::File<D>) -> Result<Self, InitError> {
        Card::from_file(value)
    }
}
