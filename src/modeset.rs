use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::blob::nul_terminated;
use crate::device::DrmDevice;
use crate::format::Format;
use crate::ioctl::{self, DrmModeInfo};
use crate::query::{self, filled_vec, ArrayRequest};
use crate::result::Error;

mod object;
mod props;
mod semantic;

pub use object::*;
pub use props::*;
pub use semantic::*;

/// Modesetting queries, available on every [`DrmDevice`].
///
/// Each query returns a snapshot. The kernel objects it describes can change
/// as soon as the query returns.
pub trait ModesetDevice: DrmDevice {
    /// The card's framebuffers, CRTCs, connectors and encoders.
    fn resources(&self) -> Result<CardResources, Error> {
        let config = self.query_config();
        let template = ioctl::DrmModeCardRes::zeroed();
        let (raw, bufs) = query::fetch(&config, &template, |r| self.get_resources_raw(r))?;
        let [fbs, crtcs, connectors, encoders] = bufs;
        Ok(CardResources {
            fb_ids: fbs.into_iter().map(FramebufferId).collect(),
            crtc_ids: crtcs.into_iter().map(CrtcId).collect(),
            connector_ids: connectors.into_iter().map(ConnectorId).collect(),
            encoder_ids: encoders.into_iter().map(EncoderId).collect(),
            min_width: raw.min_width,
            max_width: raw.max_width,
            min_height: raw.min_height,
            max_height: raw.max_height,
        })
    }

    fn connector_state(&self, connector_id: ConnectorId) -> Result<ConnectorState, Error> {
        let mut template = ioctl::DrmModeGetConnector::zeroed();
        template.connector_id = connector_id.0;
        let config = self.query_config();
        let (raw, bufs) = query::fetch(&config, &template, |r| self.get_connector_raw(r))?;
        Ok(ConnectorState {
            id: ConnectorId(raw.connector_id),
            current_encoder_id: EncoderId(raw.encoder_id),
            connector_type: raw.connector_type.into(),
            connector_type_id: raw.connector_type_id,
            connection_state: raw.connection.into(),
            width_mm: raw.mm_width,
            height_mm: raw.mm_height,
            subpixel_type: raw.subpixel.into(),
            modes: bufs.modes.iter().map(ModeInfo::from).collect(),
            props: core::iter::zip(bufs.prop_ids, bufs.prop_values)
                .map(|(id, value)| ModeProp {
                    prop_id: PropertyId(id),
                    value,
                })
                .collect(),
            available_encoder_ids: bufs.encoders.into_iter().map(EncoderId).collect(),
        })
    }

    fn encoder_state(&self, encoder_id: EncoderId) -> Result<EncoderState, Error> {
        let mut raw = ioctl::DrmModeGetEncoder::zeroed();
        raw.encoder_id = encoder_id.0;
        self.get_encoder_raw(&mut raw)?;
        Ok(EncoderState {
            encoder_id: EncoderId(raw.encoder_id),
            encoder_type: raw.encoder_type.into(),
            current_crtc_id: CrtcId(raw.crtc_id),
            possible_crtcs: raw.possible_crtcs,
            possible_clones: raw.possible_clones,
        })
    }

    fn crtc_state(&self, crtc_id: CrtcId) -> Result<CrtcState, Error> {
        let mut raw = ioctl::DrmModeCrtc::zeroed();
        raw.crtc_id = crtc_id.0;
        self.get_crtc_raw(&mut raw)?;
        Ok(raw.into())
    }

    /// Ids of the card's planes. Without [`crate::caps::ClientCap::UniversalPlanes`]
    /// the kernel reports only overlay planes.
    fn plane_ids(&self) -> Result<Vec<PlaneId>, Error> {
        let config = self.query_config();
        let template = ioctl::DrmModeGetPlaneRes::zeroed();
        let (_, ids) = query::fetch(&config, &template, |r| self.get_plane_resources_raw(r))?;
        Ok(ids.into_iter().map(PlaneId).collect())
    }

    fn plane_state(&self, plane_id: PlaneId) -> Result<PlaneState, Error> {
        let mut template = ioctl::DrmModeGetPlane::zeroed();
        template.plane_id = plane_id.0;
        let config = self.query_config();
        let (raw, formats) = query::fetch(&config, &template, |r| self.get_plane_raw(r))?;
        Ok(PlaneState {
            id: PlaneId(raw.plane_id),
            crtc_id: CrtcId(raw.crtc_id),
            fb_id: FramebufferId(raw.fb_id),
            possible_crtcs: raw.possible_crtcs,
            gamma_size: raw.gamma_size,
            formats: formats.into_iter().map(Format).collect(),
        })
    }

    /// Current raw values of every property attached to an object.
    ///
    /// The kind of `obj_id` must match the kind of object the kernel knows
    /// that id as, unless it is [`ObjectId::Any`].
    fn object_properties(
        &self,
        obj_id: impl Into<ObjectId>,
    ) -> Result<BTreeMap<PropertyId, u64>, Error> {
        let (obj_type, obj_id) = obj_id.into().as_raw_type_and_id();
        let mut template = ioctl::DrmModeObjGetProperties::zeroed();
        template.obj_id = obj_id;
        template.obj_type = obj_type;
        let config = self.query_config();
        let (_, bufs) = query::fetch(&config, &template, |r| self.obj_get_properties_raw(r))?;
        let (ids, values) = bufs;
        let props = core::iter::zip(ids, values)
            .map(|(id, value)| (PropertyId(id), value))
            .collect();
        Ok(props)
    }

    fn property_meta(&self, prop_id: PropertyId) -> Result<PropertyMeta, Error> {
        let mut template = ioctl::DrmModeGetProperty::zeroed();
        template.prop_id = prop_id.0;
        let config = self.query_config();
        let (raw, bufs) = query::fetch(&config, &template, |r| self.get_property_raw(r))?;
        Ok(PropertyMeta::from_raw(&raw, bufs))
    }

    /// The content of a property blob. The null blob is always empty and
    /// doesn't involve the kernel.
    fn property_blob(&self, blob_id: BlobId) -> Result<Vec<u8>, Error> {
        if blob_id.0 == 0 {
            return Ok(Vec::new());
        }
        let mut template = ioctl::DrmModeGetBlob::zeroed();
        template.blob_id = blob_id.0;
        let config = self.query_config();
        let (_, data) = query::fetch(&config, &template, |r| self.get_blob_raw(r))?;
        Ok(data)
    }

    /// Every property of an object with its metadata, typed value, and
    /// semantic interpretation where one is known, keyed by property name.
    fn object_property_values(
        &self,
        obj_id: impl Into<ObjectId>,
    ) -> Result<BTreeMap<String, ObjectProperty>, Error> {
        let obj_id = obj_id.into();
        let raw = self.object_properties(obj_id)?;
        let mut ret = BTreeMap::new();
        for (prop_id, value) in raw {
            let meta = self.property_meta(prop_id)?;
            let prop = ObjectProperty::resolve(self, obj_id.kind(), meta, value)?;
            ret.insert(prop.name.clone(), prop);
        }
        Ok(ret)
    }
}

impl<T: DrmDevice + ?Sized> ModesetDevice for T {}

impl ArrayRequest for ioctl::DrmModeCardRes {
    type Lengths = [u32; 4];
    type Buffers = [Vec<u32>; 4];

    fn sizing(&self) -> Self {
        Self::zeroed()
    }

    fn lengths(&self) -> [u32; 4] {
        [
            self.count_fbs(),
            self.count_crtcs(),
            self.count_connectors(),
            self.count_encoders(),
        ]
    }

    fn allocate(&self) -> Result<[Vec<u32>; 4], Error> {
        let [fbs, crtcs, connectors, encoders] = self.lengths();
        Ok([
            filled_vec(fbs, 0)?,
            filled_vec(crtcs, 0)?,
            filled_vec(connectors, 0)?,
            filled_vec(encoders, 0)?,
        ])
    }

    unsafe fn attach(&mut self, bufs: &mut [Vec<u32>; 4]) {
        let [fbs, crtcs, connectors, encoders] = bufs;
        self.set_fb_id_ptr(fbs.as_mut_ptr(), fbs.len() as u32);
        self.set_crtc_id_ptr(crtcs.as_mut_ptr(), crtcs.len() as u32);
        self.set_connector_id_ptr(connectors.as_mut_ptr(), connectors.len() as u32);
        self.set_encoder_id_ptr(encoders.as_mut_ptr(), encoders.len() as u32);
    }
}

#[derive(Debug, Default)]
pub struct ConnectorBuffers {
    encoders: Vec<u32>,
    modes: Vec<DrmModeInfo>,
    prop_ids: Vec<u32>,
    prop_values: Vec<u64>,
}

impl ArrayRequest for ioctl::DrmModeGetConnector {
    type Lengths = (u32, u32, u32);
    type Buffers = ConnectorBuffers;

    fn sizing(&self) -> Self {
        let mut ret = Self::zeroed();
        ret.connector_id = self.connector_id;
        ret
    }

    fn lengths(&self) -> (u32, u32, u32) {
        (self.count_modes(), self.count_encoders(), self.count_props())
    }

    fn allocate(&self) -> Result<ConnectorBuffers, Error> {
        Ok(ConnectorBuffers {
            encoders: filled_vec(self.count_encoders(), 0)?,
            modes: filled_vec(self.count_modes(), DrmModeInfo::zeroed())?,
            prop_ids: filled_vec(self.count_props(), 0)?,
            prop_values: filled_vec(self.count_props(), 0)?,
        })
    }

    unsafe fn attach(&mut self, bufs: &mut ConnectorBuffers) {
        self.set_encoders_ptr(bufs.encoders.as_mut_ptr(), bufs.encoders.len() as u32);
        self.set_modes_ptr(bufs.modes.as_mut_ptr(), bufs.modes.len() as u32);
        self.set_props_ptrs(
            bufs.prop_ids.as_mut_ptr(),
            bufs.prop_values.as_mut_ptr(),
            bufs.prop_ids.len() as u32,
        );
    }
}

impl ArrayRequest for ioctl::DrmModeGetPlaneRes {
    type Lengths = u32;
    type Buffers = Vec<u32>;

    fn sizing(&self) -> Self {
        Self::zeroed()
    }

    fn lengths(&self) -> u32 {
        self.count_planes()
    }

    fn allocate(&self) -> Result<Vec<u32>, Error> {
        filled_vec(self.count_planes(), 0)
    }

    unsafe fn attach(&mut self, ids: &mut Vec<u32>) {
        self.set_plane_id_ptr(ids.as_mut_ptr(), ids.len() as u32);
    }
}

impl ArrayRequest for ioctl::DrmModeGetPlane {
    type Lengths = u32;
    type Buffers = Vec<u32>;

    fn sizing(&self) -> Self {
        let mut ret = Self::zeroed();
        ret.plane_id = self.plane_id;
        ret
    }

    fn lengths(&self) -> u32 {
        self.count_format_types()
    }

    fn allocate(&self) -> Result<Vec<u32>, Error> {
        filled_vec(self.count_format_types(), 0)
    }

    unsafe fn attach(&mut self, formats: &mut Vec<u32>) {
        self.set_format_type_ptr(formats.as_mut_ptr(), formats.len() as u32);
    }
}

impl ArrayRequest for ioctl::DrmModeObjGetProperties {
    type Lengths = u32;
    type Buffers = (Vec<u32>, Vec<u64>);

    fn sizing(&self) -> Self {
        let mut ret = Self::zeroed();
        ret.obj_id = self.obj_id;
        ret.obj_type = self.obj_type;
        ret
    }

    fn lengths(&self) -> u32 {
        self.count_props()
    }

    fn allocate(&self) -> Result<(Vec<u32>, Vec<u64>), Error> {
        let count = self.count_props();
        Ok((filled_vec(count, 0)?, filled_vec(count, 0)?))
    }

    unsafe fn attach(&mut self, (ids, values): &mut (Vec<u32>, Vec<u64>)) {
        self.set_prop_ptrs(ids.as_mut_ptr(), values.as_mut_ptr(), ids.len() as u32);
    }
}

impl ArrayRequest for ioctl::DrmModeGetBlob {
    type Lengths = u32;
    type Buffers = Vec<u8>;

    fn sizing(&self) -> Self {
        let mut ret = Self::zeroed();
        ret.blob_id = self.blob_id;
        ret
    }

    fn lengths(&self) -> u32 {
        self.length()
    }

    fn allocate(&self) -> Result<Vec<u8>, Error> {
        filled_vec(self.length(), 0)
    }

    unsafe fn attach(&mut self, data: &mut Vec<u8>) {
        self.set_data_ptr(data.as_mut_ptr(), data.len() as u32);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CardResources {
    pub fb_ids: Vec<FramebufferId>,
    pub crtc_ids: Vec<CrtcId>,
    pub connector_ids: Vec<ConnectorId>,
    pub encoder_ids: Vec<EncoderId>,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConnectorState {
    pub id: ConnectorId,
    pub current_encoder_id: EncoderId,
    pub connector_type: ConnectorType,
    pub connector_type_id: u32,
    pub connection_state: ConnectionState,
    pub width_mm: u32,
    pub height_mm: u32,
    pub subpixel_type: SubpixelType,
    pub modes: Vec<ModeInfo>,
    pub props: Vec<ModeProp>,
    pub available_encoder_ids: Vec<EncoderId>,
}

impl ConnectorState {
    pub fn preferred_mode(&self) -> Option<&ModeInfo> {
        self.modes
            .iter()
            .find(|mode| (mode.typ & ioctl::DRM_MODE_TYPE_PREFERRED) != 0)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum ConnectionState {
    Connected = 1,
    Disconnected = 2,
    Unknown = 3,
}

impl From<u32> for ConnectionState {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Connected,
            2 => Self::Disconnected,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum ConnectorType {
    Unknown = 0,
    Vga = 1,
    DviI = 2,
    DviD = 3,
    DviA = 4,
    Composite = 5,
    SVideo = 6,
    Lvds = 7,
    Component = 8,
    NinePinDin = 9,
    DisplayPort = 10,
    HdmiA = 11,
    HdmiB = 12,
    Tv = 13,
    Edp = 14,
    Virtual = 15,
    Dsi = 16,
    Dpi = 17,
    Writeback = 18,
    Spi = 19,
    Usb = 20,
    Other = !0, // Not used by kernel, but used by us if kernel returns something we don't know
}

impl From<u32> for ConnectorType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Vga,
            2 => Self::DviI,
            3 => Self::DviD,
            4 => Self::DviA,
            5 => Self::Composite,
            6 => Self::SVideo,
            7 => Self::Lvds,
            8 => Self::Component,
            9 => Self::NinePinDin,
            10 => Self::DisplayPort,
            11 => Self::HdmiA,
            12 => Self::HdmiB,
            13 => Self::Tv,
            14 => Self::Edp,
            15 => Self::Virtual,
            16 => Self::Dsi,
            17 => Self::Dpi,
            18 => Self::Writeback,
            19 => Self::Spi,
            20 => Self::Usb,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum SubpixelType {
    Unknown = 1,
    HorizontalRgb = 2,
    HorizontalBgr = 3,
    VerticalRgb = 4,
    VerticalBgr = 5,
    None = 6,
}

impl From<u32> for SubpixelType {
    fn from(value: u32) -> Self {
        match value {
            2 => Self::HorizontalRgb,
            3 => Self::HorizontalBgr,
            4 => Self::VerticalRgb,
            5 => Self::VerticalBgr,
            6 => Self::None,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum EncoderType {
    None = 0,
    Dac = 1,
    Tmds = 2,
    Lvds = 3,
    TvDac = 4,
    Virtual = 5,
    Dsi = 6,
    DpMst = 7,
    Dpi = 8,
    Other = !0,
}

impl From<u32> for EncoderType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Dac,
            2 => Self::Tmds,
            3 => Self::Lvds,
            4 => Self::TvDac,
            5 => Self::Virtual,
            6 => Self::Dsi,
            7 => Self::DpMst,
            8 => Self::Dpi,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EncoderState {
    pub encoder_id: EncoderId,
    pub encoder_type: EncoderType,
    pub current_crtc_id: CrtcId,
    pub possible_crtcs: u32,
    pub possible_clones: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CrtcState {
    pub crtc_id: CrtcId,
    pub fb_id: FramebufferId,
    pub x: u32,
    pub y: u32,
    pub gamma_size: u32,
    /// The active mode, if the CRTC is driving one.
    pub mode: Option<ModeInfo>,
}

impl From<ioctl::DrmModeCrtc> for CrtcState {
    fn from(value: ioctl::DrmModeCrtc) -> Self {
        Self {
            crtc_id: CrtcId(value.crtc_id),
            fb_id: FramebufferId(value.fb_id),
            x: value.x,
            y: value.y,
            gamma_size: value.gamma_size,
            mode: (value.mode_valid != 0).then(|| ModeInfo::from(&value.mode)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlaneState {
    pub id: PlaneId,
    pub crtc_id: CrtcId,
    pub fb_id: FramebufferId,
    pub possible_crtcs: u32,
    pub gamma_size: u32,
    pub formats: Vec<Format>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModeInfo {
    pub name: String,
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub hskew: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vscan: u16,
    pub vrefresh: u32,
    pub flags: u32,
    pub typ: u32,
}

impl From<&DrmModeInfo> for ModeInfo {
    fn from(value: &DrmModeInfo) -> Self {
        Self {
            name: nul_terminated(&value.name),
            clock: value.clock,
            hdisplay: value.hdisplay,
            hsync_start: value.hsync_start,
            hsync_end: value.hsync_end,
            htotal: value.htotal,
            hskew: value.hskew,
            vdisplay: value.vdisplay,
            vsync_start: value.vsync_start,
            vsync_end: value.vsync_end,
            vtotal: value.vtotal,
            vscan: value.vscan,
            vrefresh: value.vrefresh,
            flags: value.flags,
            typ: value.typ,
        }
    }
}

#[cfg(test)]
mod tests;
