//! Device capabilities and client capabilities.

use core::fmt;

/// A capability of the device that can be queried with
/// [`crate::device::DrmDevice::device_cap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u64)]
pub enum DeviceCap {
    DumbBuffer = 0x1,
    VblankHighCrtc = 0x2,
    DumbPreferredDepth = 0x3,
    DumbPreferShadow = 0x4,
    Prime = 0x5,
    TimestampMonotonic = 0x6,
    AsyncPageFlip = 0x7,
    CursorWidth = 0x8,
    CursorHeight = 0x9,
    AddFb2Modifiers = 0x10,
    PageFlipTarget = 0x11,
    CrtcInVblankEvent = 0x12,
    SyncObj = 0x13,
    SyncObjTimeline = 0x14,
}

impl DeviceCap {
    pub const ALL: [Self; 14] = [
        Self::DumbBuffer,
        Self::VblankHighCrtc,
        Self::DumbPreferredDepth,
        Self::DumbPreferShadow,
        Self::Prime,
        Self::TimestampMonotonic,
        Self::AsyncPageFlip,
        Self::CursorWidth,
        Self::CursorHeight,
        Self::AddFb2Modifiers,
        Self::PageFlipTarget,
        Self::CrtcInVblankEvent,
        Self::SyncObj,
        Self::SyncObjTimeline,
    ];

    #[inline(always)]
    pub fn as_raw(self) -> u64 {
        self as u64
    }

    /// The kernel's name for the capability, without its `DRM_CAP_` prefix.
    pub fn name(self) -> &'static str {
        match self {
            Self::DumbBuffer => "DUMB_BUFFER",
            Self::VblankHighCrtc => "VBLANK_HIGH_CRTC",
            Self::DumbPreferredDepth => "DUMB_PREFERRED_DEPTH",
            Self::DumbPreferShadow => "DUMB_PREFER_SHADOW",
            Self::Prime => "PRIME",
            Self::TimestampMonotonic => "TIMESTAMP_MONOTONIC",
            Self::AsyncPageFlip => "ASYNC_PAGE_FLIP",
            Self::CursorWidth => "CURSOR_WIDTH",
            Self::CursorHeight => "CURSOR_HEIGHT",
            Self::AddFb2Modifiers => "ADDFB2_MODIFIERS",
            Self::PageFlipTarget => "PAGE_FLIP_TARGET",
            Self::CrtcInVblankEvent => "CRTC_IN_VBLANK_EVENT",
            Self::SyncObj => "SYNCOBJ",
            Self::SyncObjTimeline => "SYNCOBJ_TIMELINE",
        }
    }
}

impl fmt::Display for DeviceCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bits of the [`DeviceCap::Prime`] value.
pub const DRM_PRIME_CAP_IMPORT: u64 = 0x1;
pub const DRM_PRIME_CAP_EXPORT: u64 = 0x2;

/// A capability a client can ask the kernel to enable for its file
/// description, using [`crate::device::DrmDevice::set_client_cap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u64)]
pub enum ClientCap {
    Stereo3d = 1,
    /// Expose primary and cursor planes in addition to overlay planes.
    UniversalPlanes = 2,
    /// Expose atomic-only properties. The kernel also enables
    /// [`Self::UniversalPlanes`] when this is enabled.
    Atomic = 3,
    AspectRatio = 4,
    WritebackConnectors = 5,
}

impl ClientCap {
    pub const ALL: [Self; 5] = [
        Self::Stereo3d,
        Self::UniversalPlanes,
        Self::Atomic,
        Self::AspectRatio,
        Self::WritebackConnectors,
    ];

    #[inline(always)]
    pub fn as_raw(self) -> u64 {
        self as u64
    }

    /// The kernel's name for the capability, without its `DRM_CLIENT_CAP_`
    /// prefix.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stereo3d => "STEREO_3D",
            Self::UniversalPlanes => "UNIVERSAL_PLANES",
            Self::Atomic => "ATOMIC",
            Self::AspectRatio => "ASPECT_RATIO",
            Self::WritebackConnectors => "WRITEBACK_CONNECTORS",
        }
    }
}

impl fmt::Display for ClientCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of a capability request the kernel might not recognize.
///
/// Older kernels and some drivers reject unknown capabilities with `EINVAL`,
/// which this type reports as [`Capability::Unsupported`] rather than as an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Capability<T> {
    Supported(T),
    Unsupported,
}

impl<T> Capability<T> {
    #[inline]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    #[inline]
    pub fn supported(self) -> Option<T> {
        match self {
            Self::Supported(v) => Some(v),
            Self::Unsupported => None,
        }
    }
}
