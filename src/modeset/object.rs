use core::fmt;

use crate::ioctl;

macro_rules! object_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

object_id_type!(FramebufferId);
object_id_type!(CrtcId);
object_id_type!(ConnectorId);
object_id_type!(EncoderId);
object_id_type!(ModeId);
object_id_type!(PropertyId);
object_id_type!(
    /// Identifies a property blob. Zero means "no blob".
    BlobId
);
object_id_type!(PlaneId);

/// The kinds of object the kernel tags its modesetting object ids with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum ObjectKind {
    Any = ioctl::DRM_MODE_OBJECT_ANY,
    Crtc = ioctl::DRM_MODE_OBJECT_CRTC,
    Connector = ioctl::DRM_MODE_OBJECT_CONNECTOR,
    Encoder = ioctl::DRM_MODE_OBJECT_ENCODER,
    Mode = ioctl::DRM_MODE_OBJECT_MODE,
    Property = ioctl::DRM_MODE_OBJECT_PROPERTY,
    Framebuffer = ioctl::DRM_MODE_OBJECT_FB,
    Blob = ioctl::DRM_MODE_OBJECT_BLOB,
    Plane = ioctl::DRM_MODE_OBJECT_PLANE,
}

impl ObjectKind {
    pub const ALL: [Self; 9] = [
        Self::Any,
        Self::Crtc,
        Self::Connector,
        Self::Encoder,
        Self::Mode,
        Self::Property,
        Self::Framebuffer,
        Self::Blob,
        Self::Plane,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            ioctl::DRM_MODE_OBJECT_ANY => Self::Any,
            ioctl::DRM_MODE_OBJECT_CRTC => Self::Crtc,
            ioctl::DRM_MODE_OBJECT_CONNECTOR => Self::Connector,
            ioctl::DRM_MODE_OBJECT_ENCODER => Self::Encoder,
            ioctl::DRM_MODE_OBJECT_MODE => Self::Mode,
            ioctl::DRM_MODE_OBJECT_PROPERTY => Self::Property,
            ioctl::DRM_MODE_OBJECT_FB => Self::Framebuffer,
            ioctl::DRM_MODE_OBJECT_BLOB => Self::Blob,
            ioctl::DRM_MODE_OBJECT_PLANE => Self::Plane,
            _ => return None,
        })
    }

    #[inline(always)]
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "Any",
            Self::Crtc => "CRTC",
            Self::Connector => "Connector",
            Self::Encoder => "Encoder",
            Self::Mode => "Mode",
            Self::Property => "Property",
            Self::Framebuffer => "FB",
            Self::Blob => "Blob",
            Self::Plane => "Plane",
        })
    }
}

/// A modesetting object id tagged with the kind of object it refers to.
///
/// The kernel needs both parts to look up an object's properties, and
/// rejects the request if the kind doesn't match the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ObjectId {
    /// An id whose kind is not known. The kernel accepts this for property
    /// queries and resolves the kind itself.
    Any(u32),
    Crtc(CrtcId),
    Connector(ConnectorId),
    Encoder(EncoderId),
    Mode(ModeId),
    Property(PropertyId),
    Framebuffer(FramebufferId),
    Blob(BlobId),
    Plane(PlaneId),
}

impl ObjectId {
    /// Tag `id` with the object kind given by the raw `kind` tag.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not one of the kernel's object kinds. Use
    /// [`Self::try_from_raw`] for tags from an untrusted source.
    pub fn from_raw(id: u32, kind: u32) -> Self {
        match Self::try_from_raw(id, kind) {
            Some(ret) => ret,
            None => panic!("unknown DRM object kind {kind:#010x}"),
        }
    }

    pub fn try_from_raw(id: u32, kind: u32) -> Option<Self> {
        ObjectKind::from_raw(kind).map(|kind| Self::new(id, kind))
    }

    pub fn new(id: u32, kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Any => Self::Any(id),
            ObjectKind::Crtc => Self::Crtc(CrtcId(id)),
            ObjectKind::Connector => Self::Connector(ConnectorId(id)),
            ObjectKind::Encoder => Self::Encoder(EncoderId(id)),
            ObjectKind::Mode => Self::Mode(ModeId(id)),
            ObjectKind::Property => Self::Property(PropertyId(id)),
            ObjectKind::Framebuffer => Self::Framebuffer(FramebufferId(id)),
            ObjectKind::Blob => Self::Blob(BlobId(id)),
            ObjectKind::Plane => Self::Plane(PlaneId(id)),
        }
    }

    pub fn kind(self) -> ObjectKind {
        match self {
            Self::Any(_) => ObjectKind::Any,
            Self::Crtc(_) => ObjectKind::Crtc,
            Self::Connector(_) => ObjectKind::Connector,
            Self::Encoder(_) => ObjectKind::Encoder,
            Self::Mode(_) => ObjectKind::Mode,
            Self::Property(_) => ObjectKind::Property,
            Self::Framebuffer(_) => ObjectKind::Framebuffer,
            Self::Blob(_) => ObjectKind::Blob,
            Self::Plane(_) => ObjectKind::Plane,
        }
    }

    /// The bare numeric id, without its kind.
    pub fn raw_id(self) -> u32 {
        match self {
            Self::Any(id) => id,
            Self::Crtc(id) => id.0,
            Self::Connector(id) => id.0,
            Self::Encoder(id) => id.0,
            Self::Mode(id) => id.0,
            Self::Property(id) => id.0,
            Self::Framebuffer(id) => id.0,
            Self::Blob(id) => id.0,
            Self::Plane(id) => id.0,
        }
    }

    pub fn as_raw_type_and_id(self) -> (u32, u32) {
        (self.kind().as_raw(), self.raw_id())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.raw_id())
    }
}

macro_rules! object_id_from {
    ($t:ident, $variant:ident) => {
        impl From<$t> for ObjectId {
            #[inline(always)]
            fn from(value: $t) -> Self {
                Self::$variant(value)
            }
        }
    };
}

object_id_from!(CrtcId, Crtc);
object_id_from!(ConnectorId, Connector);
object_id_from!(EncoderId, Encoder);
object_id_from!(ModeId, Mode);
object_id_from!(PropertyId, Property);
object_id_from!(FramebufferId, Framebuffer);
object_id_from!(BlobId, Blob);
object_id_from!(PlaneId, Plane);
