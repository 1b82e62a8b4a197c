//! An in-memory stand-in for a DRM card, which answers requests the way the
//! kernel does: it always reports the real array lengths, and copies array
//! contents out only when the caller's capacity is large enough.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::device::DrmDevice;
use crate::ioctl::{self, DrmModeInfo, DrmModePropertyEnum};
use crate::query::QueryConfig;
use crate::result::Error;

/// A sequence of states returned by successive requests. Once the script
/// runs out, the last state repeats.
#[derive(Debug, Default)]
pub(crate) struct Script<T> {
    states: Vec<T>,
    next: Cell<usize>,
}

impl<T> Script<T> {
    pub fn new(states: Vec<T>) -> Self {
        Self {
            states,
            next: Cell::new(0),
        }
    }

    pub fn fixed(state: T) -> Self {
        Self::new(vec![state])
    }

    fn advance(&self) -> Option<&T> {
        let i = self.next.get();
        self.next.set(i + 1);
        self.states.get(i.min(self.states.len().saturating_sub(1)))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeResources {
    pub fbs: Vec<u32>,
    pub crtcs: Vec<u32>,
    pub connectors: Vec<u32>,
    pub encoders: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeConnector {
    pub encoder_id: u32,
    pub connector_type: u32,
    pub connector_type_id: u32,
    pub connection: u32,
    pub mm_width: u32,
    pub mm_height: u32,
    pub subpixel: u32,
    pub encoders: Vec<u32>,
    pub modes: Vec<DrmModeInfo>,
    pub props: Vec<(u32, u64)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeCrtc {
    pub fb_id: u32,
    pub x: u32,
    pub y: u32,
    pub gamma_size: u32,
    pub mode: Option<DrmModeInfo>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePlane {
    pub crtc_id: u32,
    pub fb_id: u32,
    pub possible_crtcs: u32,
    pub gamma_size: u32,
    pub formats: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeProperty {
    pub name: &'static str,
    pub flags: u32,
    pub values: Vec<u64>,
    pub enums: Vec<(&'static str, u64)>,
    /// (blob id, blob length) pairs, as reported by older kernels.
    pub blobs: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDriver {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub name: &'static str,
    pub date: &'static str,
    pub desc: &'static str,
}

#[derive(Debug, Default)]
pub(crate) struct FakeDevice {
    pub driver: FakeDriver,
    pub caps: BTreeMap<u64, u64>,
    pub client_caps: Vec<u64>,
    /// Returned by every capability request, when set.
    pub cap_failure: Option<Error>,
    pub resources: Script<FakeResources>,
    pub connectors: BTreeMap<u32, Script<FakeConnector>>,
    pub encoders: BTreeMap<u32, (u32, u32, u32, u32)>,
    pub crtcs: BTreeMap<u32, FakeCrtc>,
    pub plane_ids: Script<Vec<u32>>,
    pub planes: BTreeMap<u32, FakePlane>,
    /// Property lists keyed by (object kind, object id).
    pub objects: BTreeMap<(u32, u32), Vec<(u32, u64)>>,
    pub properties: BTreeMap<u32, FakeProperty>,
    pub blobs: BTreeMap<u32, Vec<u8>>,
    pub config: Option<QueryConfig>,

    pub calls: RefCell<Vec<&'static str>>,
    pub client_caps_set: RefCell<Vec<(u64, u64)>>,
}

impl FakeDevice {
    pub fn call_count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
    }
}

/// Copy `src` to the user buffer at `dst` if `capacity` is large enough, and
/// return the number of elements the kernel would report.
unsafe fn copy_out<T: Copy>(dst: u64, capacity: u32, src: &[T]) -> u32 {
    if !src.is_empty() && capacity as usize >= src.len() {
        core::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut T, src.len());
    }
    src.len() as u32
}

unsafe fn copy_str_out(dst: *mut u8, capacity: usize, src: &str) -> usize {
    let n = capacity.min(src.len());
    if n != 0 {
        core::ptr::copy_nonoverlapping(src.as_ptr(), dst, n);
    }
    src.len()
}

fn fill_name(dst: &mut [u8], name: &str) {
    for (d, s) in dst.iter_mut().zip(name.bytes()) {
        *d = s;
    }
}

pub(crate) fn mode(
    name: &str,
    hdisplay: u16,
    vdisplay: u16,
    vrefresh: u32,
    typ: u32,
) -> DrmModeInfo {
    let mut ret = DrmModeInfo::zeroed();
    ret.clock = u32::from(hdisplay) * u32::from(vdisplay) * vrefresh / 1000;
    ret.hdisplay = hdisplay;
    ret.vdisplay = vdisplay;
    ret.vrefresh = vrefresh;
    ret.typ = typ;
    fill_name(&mut ret.name, name);
    ret
}

impl DrmDevice for FakeDevice {
    fn version_raw(&self, arg: &mut ioctl::DrmVersion) -> Result<(), Error> {
        self.record("version");
        let d = &self.driver;
        arg.version_major = d.major;
        arg.version_minor = d.minor;
        arg.version_patchlevel = d.patch;
        unsafe {
            arg.name_len = copy_str_out(arg.name, arg.name_len, d.name);
            arg.date_len = copy_str_out(arg.date, arg.date_len, d.date);
            arg.desc_len = copy_str_out(arg.desc, arg.desc_len, d.desc);
        }
        Ok(())
    }

    fn get_cap_raw(&self, arg: &mut ioctl::DrmGetCap) -> Result<(), Error> {
        self.record("get_cap");
        if let Some(e) = self.cap_failure {
            return Err(e);
        }
        arg.value = *self.caps.get(&arg.capability).ok_or(Error::Invalid)?;
        Ok(())
    }

    fn set_client_cap_raw(&self, arg: &ioctl::DrmSetClientCap) -> Result<(), Error> {
        self.record("set_client_cap");
        if let Some(e) = self.cap_failure {
            return Err(e);
        }
        if !self.client_caps.contains(&arg.capability) {
            return Err(Error::Invalid);
        }
        self.client_caps_set
            .borrow_mut()
            .push((arg.capability, arg.value));
        Ok(())
    }

    fn get_resources_raw(&self, arg: &mut ioctl::DrmModeCardRes) -> Result<(), Error> {
        self.record("get_resources");
        let s = self.resources.advance().ok_or(Error::NonExist)?;
        unsafe {
            arg.count_fbs = copy_out(arg.fb_id_ptr, arg.count_fbs, &s.fbs);
            arg.count_crtcs = copy_out(arg.crtc_id_ptr, arg.count_crtcs, &s.crtcs);
            arg.count_connectors =
                copy_out(arg.connector_id_ptr, arg.count_connectors, &s.connectors);
            arg.count_encoders = copy_out(arg.encoder_id_ptr, arg.count_encoders, &s.encoders);
        }
        arg.min_width = 1;
        arg.max_width = 16384;
        arg.min_height = 1;
        arg.max_height = 16384;
        Ok(())
    }

    fn get_crtc_raw(&self, arg: &mut ioctl::DrmModeCrtc) -> Result<(), Error> {
        self.record("get_crtc");
        let crtc = self.crtcs.get(&arg.crtc_id).ok_or(Error::NonExist)?;
        arg.fb_id = crtc.fb_id;
        arg.x = crtc.x;
        arg.y = crtc.y;
        arg.gamma_size = crtc.gamma_size;
        match crtc.mode {
            Some(mode) => {
                arg.mode_valid = 1;
                arg.mode = mode;
            }
            None => {
                arg.mode_valid = 0;
                arg.mode = DrmModeInfo::zeroed();
            }
        }
        Ok(())
    }

    fn get_encoder_raw(&self, arg: &mut ioctl::DrmModeGetEncoder) -> Result<(), Error> {
        self.record("get_encoder");
        let (typ, crtc_id, possible_crtcs, possible_clones) =
            *self.encoders.get(&arg.encoder_id).ok_or(Error::NonExist)?;
        arg.encoder_type = typ;
        arg.crtc_id = crtc_id;
        arg.possible_crtcs = possible_crtcs;
        arg.possible_clones = possible_clones;
        Ok(())
    }

    fn get_connector_raw(&self, arg: &mut ioctl::DrmModeGetConnector) -> Result<(), Error> {
        self.record("get_connector");
        let state = self
            .connectors
            .get(&arg.connector_id)
            .and_then(|s| s.advance())
            .ok_or(Error::NonExist)?;
        let prop_ids: Vec<u32> = state.props.iter().map(|(id, _)| *id).collect();
        let prop_values: Vec<u64> = state.props.iter().map(|(_, v)| *v).collect();
        unsafe {
            arg.count_encoders = copy_out(arg.encoders_ptr, arg.count_encoders, &state.encoders);
            arg.count_modes = copy_out(arg.modes_ptr, arg.count_modes, &state.modes);
            copy_out(arg.props_ptr, arg.count_props, &prop_ids);
            arg.count_props = copy_out(arg.prop_values_ptr, arg.count_props, &prop_values);
        }
        arg.encoder_id = state.encoder_id;
        arg.connector_type = state.connector_type;
        arg.connector_type_id = state.connector_type_id;
        arg.connection = state.connection;
        arg.mm_width = state.mm_width;
        arg.mm_height = state.mm_height;
        arg.subpixel = state.subpixel;
        Ok(())
    }

    fn get_plane_resources_raw(&self, arg: &mut ioctl::DrmModeGetPlaneRes) -> Result<(), Error> {
        self.record("get_plane_resources");
        let ids = self.plane_ids.advance().ok_or(Error::NonExist)?;
        arg.count_planes = unsafe { copy_out(arg.plane_id_ptr, arg.count_planes, ids) };
        Ok(())
    }

    fn get_plane_raw(&self, arg: &mut ioctl::DrmModeGetPlane) -> Result<(), Error> {
        self.record("get_plane");
        let plane = self.planes.get(&arg.plane_id).ok_or(Error::NonExist)?;
        arg.crtc_id = plane.crtc_id;
        arg.fb_id = plane.fb_id;
        arg.possible_crtcs = plane.possible_crtcs;
        arg.gamma_size = plane.gamma_size;
        let codes = plane.formats.as_slice();
        unsafe {
            arg.count_format_types = copy_out(arg.format_type_ptr, arg.count_format_types, codes);
        }
        Ok(())
    }

    fn obj_get_properties_raw(
        &self,
        arg: &mut ioctl::DrmModeObjGetProperties,
    ) -> Result<(), Error> {
        self.record("obj_get_properties");
        let any_kind = arg.obj_type == ioctl::DRM_MODE_OBJECT_ANY;
        let props = self
            .objects
            .iter()
            .find(|((kind, id), _)| *id == arg.obj_id && (any_kind || *kind == arg.obj_type))
            .map(|(_, props)| props)
            .ok_or(Error::NonExist)?;
        let ids: Vec<u32> = props.iter().map(|(id, _)| *id).collect();
        let values: Vec<u64> = props.iter().map(|(_, v)| *v).collect();
        unsafe {
            copy_out(arg.props_ptr, arg.count_props, &ids);
            arg.count_props = copy_out(arg.prop_values_ptr, arg.count_props, &values);
        }
        Ok(())
    }

    fn get_property_raw(&self, arg: &mut ioctl::DrmModeGetProperty) -> Result<(), Error> {
        self.record("get_property");
        let prop = self.properties.get(&arg.prop_id).ok_or(Error::NonExist)?;
        arg.flags = prop.flags;
        arg.name = [0; ioctl::DRM_PROP_NAME_LEN];
        fill_name(&mut arg.name, prop.name);
        unsafe {
            if (prop.flags & ioctl::DRM_MODE_PROP_BLOB) != 0 {
                let lengths: Vec<u32> = prop.blobs.iter().map(|(_, len)| *len).collect();
                let ids: Vec<u32> = prop.blobs.iter().map(|(id, _)| *id).collect();
                copy_out(arg.values_ptr, arg.count_enum_blobs, &lengths);
                arg.count_enum_blobs = copy_out(arg.enum_blob_ptr, arg.count_enum_blobs, &ids);
                arg.count_values = 0;
            } else {
                let enums: Vec<DrmModePropertyEnum> = prop
                    .enums
                    .iter()
                    .map(|(name, value)| {
                        let mut e = DrmModePropertyEnum::zeroed();
                        e.value = *value;
                        fill_name(&mut e.name, name);
                        e
                    })
                    .collect();
                arg.count_values = copy_out(arg.values_ptr, arg.count_values, &prop.values);
                arg.count_enum_blobs = copy_out(arg.enum_blob_ptr, arg.count_enum_blobs, &enums);
            }
        }
        Ok(())
    }

    fn get_blob_raw(&self, arg: &mut ioctl::DrmModeGetBlob) -> Result<(), Error> {
        self.record("get_blob");
        let data = self.blobs.get(&arg.blob_id).ok_or(Error::NonExist)?;
        let capacity = arg.length;
        if capacity as usize >= data.len() && !data.is_empty() {
            let dst = arg.data as *mut u8;
            unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len()) };
        }
        arg.length = data.len() as u32;
        Ok(())
    }

    fn query_config(&self) -> QueryConfig {
        self.config.unwrap_or_default()
    }
}
