use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::blob::nul_terminated;
use crate::ioctl::{self, DrmModeGetProperty, DrmModePropertyEnum};
use crate::query::{filled_vec, ArrayRequest};
use crate::result::Error;

use super::{BlobId, ObjectId, ObjectKind, PropertyId};

/// One entry from an object's property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModeProp {
    pub prop_id: PropertyId,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
#[repr(u32)]
pub enum PropertyType {
    /// The flags carry no type bits, or a combination the kernel never
    /// produces.
    Unknown = 0,
    Range = ioctl::DRM_MODE_PROP_RANGE,
    Enum = ioctl::DRM_MODE_PROP_ENUM,
    Blob = ioctl::DRM_MODE_PROP_BLOB,
    Bitmask = ioctl::DRM_MODE_PROP_BITMASK,
    Object = ioctl::DRM_MODE_PROP_OBJECT,
    SignedRange = ioctl::DRM_MODE_PROP_SIGNED_RANGE,
}

impl PropertyType {
    /// Classify a property's flag word, returning the type and whether the
    /// property is immutable.
    pub fn from_raw_flags(flags: u32) -> (Self, bool) {
        let immutable = (flags & ioctl::DRM_MODE_PROP_IMMUTABLE) != 0;
        let type_mask = ioctl::DRM_MODE_PROP_LEGACY_TYPE | ioctl::DRM_MODE_PROP_EXTENDED_TYPE;
        let type_raw = flags & type_mask;
        let typ = match type_raw {
            ioctl::DRM_MODE_PROP_RANGE => Self::Range,
            ioctl::DRM_MODE_PROP_ENUM => Self::Enum,
            ioctl::DRM_MODE_PROP_BLOB => Self::Blob,
            ioctl::DRM_MODE_PROP_BITMASK => Self::Bitmask,
            ioctl::DRM_MODE_PROP_OBJECT => Self::Object,
            ioctl::DRM_MODE_PROP_SIGNED_RANGE => Self::SignedRange,
            _ => Self::Unknown,
        };
        (typ, immutable)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "Unknown",
            Self::Range => "Range",
            Self::Enum => "Enum",
            Self::Blob => "Blob",
            Self::Bitmask => "Bitmask",
            Self::Object => "Object",
            Self::SignedRange => "Signed range",
        })
    }
}

/// A named value of an enum property, or a named bit of a bitmask property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertyEnumMember {
    pub name: String,
    pub value: u64,
}

impl From<&DrmModePropertyEnum> for PropertyEnumMember {
    fn from(value: &DrmModePropertyEnum) -> Self {
        Self {
            name: nul_terminated(&value.name),
            value: value.value,
        }
    }
}

/// A candidate blob of a blob property, as reported by older kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertyBlob {
    pub id: BlobId,
    pub size: u32,
}

/// Everything the kernel reports about a property itself, independent of
/// any object it's attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertyMeta {
    pub id: PropertyId,
    pub name: String,
    pub flags: u32,
    pub values: Vec<u64>,
    pub enum_members: Vec<PropertyEnumMember>,
    pub blobs: Vec<PropertyBlob>,
}

impl PropertyMeta {
    #[inline]
    pub fn property_type(&self) -> PropertyType {
        PropertyType::from_raw_flags(self.flags).0
    }

    #[inline]
    pub fn is_immutable(&self) -> bool {
        PropertyType::from_raw_flags(self.flags).1
    }

    /// Whether the property is only visible to atomic clients.
    #[inline]
    pub fn is_atomic(&self) -> bool {
        (self.flags & ioctl::DRM_MODE_PROP_ATOMIC) != 0
    }

    /// Minimum and maximum of a range property.
    pub fn range(&self) -> Option<(u64, u64)> {
        match (self.property_type(), self.values.as_slice()) {
            (PropertyType::Range, [min, max]) => Some((*min, *max)),
            _ => None,
        }
    }

    /// Minimum and maximum of a signed range property.
    pub fn signed_range(&self) -> Option<(i64, i64)> {
        match (self.property_type(), self.values.as_slice()) {
            (PropertyType::SignedRange, [min, max]) => Some((*min as i64, *max as i64)),
            _ => None,
        }
    }

    pub fn enum_members(&self) -> Option<&[PropertyEnumMember]> {
        match self.property_type() {
            PropertyType::Enum | PropertyType::Bitmask => Some(&self.enum_members),
            _ => None,
        }
    }

    pub fn blobs(&self) -> Option<&[PropertyBlob]> {
        match self.property_type() {
            PropertyType::Blob => Some(&self.blobs),
            _ => None,
        }
    }

    /// The kind of object an object property may refer to.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        match (self.property_type(), self.values.as_slice()) {
            (PropertyType::Object, [kind]) => ObjectKind::from_raw(*kind as u32),
            _ => None,
        }
    }

    /// The name of the enum member with the given value.
    pub fn enum_name(&self, value: u64) -> Option<&str> {
        self.enum_members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.name.as_str())
    }

    /// Interpret a raw value of this property according to its type.
    #[inline]
    pub fn decode_value(&self, raw: u64) -> PropertyValue {
        PropertyValue::decode(self.property_type(), raw)
    }
}

/// A raw property value interpreted according to the property's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PropertyValue {
    /// Range, enum and bitmask values, and values of unknown type. Their
    /// meaning depends on the particular property.
    Unsigned(u64),
    Signed(i64),
    /// An object reference. The property value doesn't say what kind of
    /// object it refers to, so the id is always [`ObjectId::Any`].
    Object(ObjectId),
    /// A blob reference, or `None` for the null blob.
    Blob(Option<BlobId>),
}

impl PropertyValue {
    pub fn decode(typ: PropertyType, raw: u64) -> Self {
        match typ {
            PropertyType::Blob => match raw as u32 {
                0 => Self::Blob(None),
                id => Self::Blob(Some(BlobId(id))),
            },
            PropertyType::Object => Self::Object(ObjectId::Any(raw as u32)),
            PropertyType::SignedRange => Self::Signed(raw as i64),
            _ => Self::Unsigned(raw),
        }
    }
}

/// Buffers for the type-dependent arrays of a property request.
#[derive(Debug, Default)]
pub struct PropertyBuffers {
    values: Vec<u64>,
    enums: Vec<DrmModePropertyEnum>,
    blob_lengths: Vec<u32>,
    blob_ids: Vec<u32>,
}

impl ArrayRequest for DrmModeGetProperty {
    type Lengths = (u32, u32);
    type Buffers = PropertyBuffers;

    fn sizing(&self) -> Self {
        let mut ret = Self::zeroed();
        ret.prop_id = self.prop_id;
        ret
    }

    fn lengths(&self) -> (u32, u32) {
        (self.count_values(), self.count_enum_blobs())
    }

    fn allocate(&self) -> Result<PropertyBuffers, Error> {
        let (typ, _) = PropertyType::from_raw_flags(self.flags);
        let mut bufs = PropertyBuffers::default();
        match typ {
            PropertyType::Enum | PropertyType::Bitmask => {
                bufs.values = filled_vec(self.count_values(), 0)?;
                bufs.enums = filled_vec(self.count_enum_blobs(), DrmModePropertyEnum::zeroed())?;
            }
            PropertyType::Blob => {
                // The values array doubles as the blob lengths array here, so
                // the kernel can't also be reporting ordinary values.
                if self.count_values() != 0 {
                    panic!(
                        "blob property {} reported {} values",
                        self.prop_id,
                        self.count_values()
                    );
                }
                bufs.blob_lengths = filled_vec(self.count_enum_blobs(), 0)?;
                bufs.blob_ids = filled_vec(self.count_enum_blobs(), 0)?;
            }
            PropertyType::Range | PropertyType::SignedRange | PropertyType::Object => {
                if self.count_enum_blobs() != 0 {
                    panic!(
                        "{typ} property {} reported {} enum entries",
                        self.prop_id,
                        self.count_enum_blobs()
                    );
                }
                bufs.values = filled_vec(self.count_values(), 0)?;
            }
            PropertyType::Unknown => {
                bufs.values = filled_vec(self.count_values(), 0)?;
            }
        }
        Ok(bufs)
    }

    unsafe fn attach(&mut self, bufs: &mut PropertyBuffers) {
        let (typ, _) = PropertyType::from_raw_flags(self.flags);
        match typ {
            PropertyType::Blob => self.set_blob_ptrs(
                bufs.blob_lengths.as_mut_ptr(),
                bufs.blob_ids.as_mut_ptr(),
                bufs.blob_ids.len() as u32,
            ),
            _ => {
                self.set_values_ptr(bufs.values.as_mut_ptr(), bufs.values.len() as u32);
                self.set_enum_blob_ptr(bufs.enums.as_mut_ptr(), bufs.enums.len() as u32);
            }
        }
    }
}

impl PropertyMeta {
    pub(crate) fn from_raw(raw: &DrmModeGetProperty, bufs: PropertyBuffers) -> Self {
        let PropertyBuffers {
            values,
            enums,
            blob_lengths,
            blob_ids,
        } = bufs;
        if blob_lengths.len() != blob_ids.len() {
            let id = raw.prop_id;
            panic!("blob lengths and ids of property {id} differ in length");
        }
        Self {
            id: PropertyId(raw.prop_id),
            name: nul_terminated(&raw.name),
            flags: raw.flags,
            values,
            enum_members: enums.iter().map(PropertyEnumMember::from).collect(),
            blobs: core::iter::zip(blob_ids, blob_lengths)
                .map(|(id, size)| PropertyBlob {
                    id: BlobId(id),
                    size,
                })
                .collect(),
        }
    }
}
