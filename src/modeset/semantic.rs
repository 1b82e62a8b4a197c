use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::blob::{self, DecodeError, FormatModifierSet};
use crate::format::{Format, Modifier};
use crate::result::Error;

use super::{ModeInfo, ModesetDevice, ObjectKind};
use super::{PropertyEnumMember, PropertyId, PropertyMeta, PropertyType, PropertyValue};

/// How to interpret the value of a well-known property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    /// A 16.16 fixed-point value, reduced to its integer part.
    FixedPoint16,
    /// A format/modifier table blob.
    InFormats,
    /// A single mode record blob.
    ModeId,
    /// A blob holding an array of format codes.
    WritebackPixelFormats,
    /// A blob holding a text path.
    Path,
}

/// A well-known property, the object kind and property type it is expected
/// to have, and how to decode its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticDecoder {
    pub name: &'static str,
    pub object_kind: ObjectKind,
    pub property_type: PropertyType,
    pub kind: DecoderKind,
}

pub static SEMANTIC_DECODERS: &[SemanticDecoder] = &[
    SemanticDecoder {
        name: "SRC_X",
        object_kind: ObjectKind::Plane,
        property_type: PropertyType::Range,
        kind: DecoderKind::FixedPoint16,
    },
    SemanticDecoder {
        name: "SRC_Y",
        object_kind: ObjectKind::Plane,
        property_type: PropertyType::Range,
        kind: DecoderKind::FixedPoint16,
    },
    SemanticDecoder {
        name: "SRC_W",
        object_kind: ObjectKind::Plane,
        property_type: PropertyType::Range,
        kind: DecoderKind::FixedPoint16,
    },
    SemanticDecoder {
        name: "SRC_H",
        object_kind: ObjectKind::Plane,
        property_type: PropertyType::Range,
        kind: DecoderKind::FixedPoint16,
    },
    SemanticDecoder {
        name: "IN_FORMATS",
        object_kind: ObjectKind::Plane,
        property_type: PropertyType::Blob,
        kind: DecoderKind::InFormats,
    },
    SemanticDecoder {
        name: "MODE_ID",
        object_kind: ObjectKind::Crtc,
        property_type: PropertyType::Blob,
        kind: DecoderKind::ModeId,
    },
    SemanticDecoder {
        name: "WRITEBACK_PIXEL_FORMATS",
        object_kind: ObjectKind::Connector,
        property_type: PropertyType::Blob,
        kind: DecoderKind::WritebackPixelFormats,
    },
    SemanticDecoder {
        name: "PATH",
        object_kind: ObjectKind::Connector,
        property_type: PropertyType::Blob,
        kind: DecoderKind::Path,
    },
];

impl SemanticDecoder {
    pub fn lookup(name: &str) -> Option<&'static Self> {
        SEMANTIC_DECODERS.iter().find(|d| d.name == name)
    }

    /// Decode a property value. `blob` is the content of the referenced
    /// blob, and is ignored by decoders of non-blob properties.
    pub fn decode(&self, raw: u64, blob: &[u8]) -> Result<SemanticValue, DecodeError> {
        Ok(match self.kind {
            DecoderKind::FixedPoint16 => SemanticValue::Integer(raw >> 16),
            DecoderKind::InFormats => {
                SemanticValue::FormatModifiers(FormatModifierSet::parse(blob)?.to_map())
            }
            DecoderKind::ModeId => SemanticValue::Mode(blob::parse_mode_info(blob)?),
            DecoderKind::WritebackPixelFormats => {
                SemanticValue::Formats(blob::parse_formats(blob)?)
            }
            DecoderKind::Path => SemanticValue::Path(blob::parse_path(blob)),
        })
    }
}

/// The interpretation of a well-known property's value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SemanticValue {
    Integer(u64),
    FormatModifiers(BTreeMap<Modifier, Vec<Format>>),
    Mode(ModeInfo),
    Formats(Vec<Format>),
    Path(String),
}

/// A property of a particular object, with its current value decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectProperty {
    pub id: PropertyId,
    pub name: String,
    pub typ: PropertyType,
    pub immutable: bool,
    pub atomic: bool,
    pub raw_value: u64,
    pub value: PropertyValue,
    /// Named values of an enum property, or named bits of a bitmask
    /// property. Empty for other types.
    pub enum_members: Vec<PropertyEnumMember>,
    /// Content of the referenced blob. Empty for the null blob and for
    /// properties that aren't blobs.
    pub blob: Vec<u8>,
    /// Present only for well-known properties whose object kind and type
    /// matched what was expected, and which don't refer to the null blob.
    pub semantic: Option<Result<SemanticValue, DecodeError>>,
}

impl ObjectProperty {
    /// Combine a property's metadata with an object's current value for it,
    /// fetching the referenced blob if there is one.
    pub fn resolve<D: ModesetDevice + ?Sized>(
        dev: &D,
        object_kind: ObjectKind,
        meta: PropertyMeta,
        raw_value: u64,
    ) -> Result<Self, Error> {
        let (typ, immutable) = PropertyType::from_raw_flags(meta.flags);
        let value = PropertyValue::decode(typ, raw_value);
        let blob = match value {
            PropertyValue::Blob(Some(blob_id)) => dev.property_blob(blob_id)?,
            _ => Vec::new(),
        };
        let semantic = semantic_value(object_kind, &meta.name, typ, raw_value, &blob);
        let atomic = meta.is_atomic();
        let enum_members = match typ {
            PropertyType::Enum | PropertyType::Bitmask => meta.enum_members,
            _ => Vec::new(),
        };
        Ok(Self {
            id: meta.id,
            name: meta.name,
            typ,
            immutable,
            atomic,
            raw_value,
            value,
            enum_members,
            blob,
            semantic,
        })
    }

    /// The name of the current value of an enum property.
    pub fn enum_name(&self) -> Option<&str> {
        if self.typ != PropertyType::Enum {
            return None;
        }
        self.enum_members
            .iter()
            .find(|m| m.value == self.raw_value)
            .map(|m| m.name.as_str())
    }
}

/// Apply the well-known decoder for `name`, if there is one and the
/// property matches its expectations. A null blob has nothing to decode.
pub fn semantic_value(
    object_kind: ObjectKind,
    name: &str,
    typ: PropertyType,
    raw_value: u64,
    blob: &[u8],
) -> Option<Result<SemanticValue, DecodeError>> {
    let decoder = SemanticDecoder::lookup(name)?;
    if decoder.object_kind != object_kind || decoder.property_type != typ {
        let (want_type, want_kind) = (decoder.property_type, decoder.object_kind);
        log::warn!(
            "property {name} is a {typ} property of a {object_kind} object, \
             but expected a {want_type} property of a {want_kind} object; not decoding it"
        );
        return None;
    }
    if PropertyValue::decode(typ, raw_value) == PropertyValue::Blob(None) {
        return None;
    }
    let ret = decoder.decode(raw_value, blob);
    if let Err(e) = &ret {
        log::warn!("failed to decode {object_kind} property {name}: {e}");
    }
    Some(ret)
}
