//! Decoders for well-known property blob payloads.
//!
//! Blob payloads are in the kernel's native byte order. Every field is read
//! from a named offset after checking that the payload is long enough, so a
//! malformed blob produces a [`DecodeError`] rather than a panic.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::format::{Format, Modifier};
use crate::ioctl::DRM_DISPLAY_MODE_LEN;
use crate::modeset::ModeInfo;

/// A blob payload that doesn't have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecodeError {
    #[error("{what} needs at least {need} bytes but blob has {have}")]
    TooShort {
        what: &'static str,
        need: usize,
        have: usize,
    },
    #[error("{what} must be exactly {need} bytes but blob has {have}")]
    WrongLength {
        what: &'static str,
        need: usize,
        have: usize,
    },
    #[error("{what} length {have} is not a multiple of {element_size}")]
    Misaligned {
        what: &'static str,
        element_size: usize,
        have: usize,
    },
    #[error("unsupported format modifier blob version {0}")]
    UnsupportedVersion(u32),
    #[error(
        "modifier {modifier:#018x} refers to format index {index} but only {count} formats exist"
    )]
    FormatIndexOutOfRange {
        modifier: u64,
        index: u64,
        count: usize,
    },
}

#[inline]
fn field<const N: usize>(
    b: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<[u8; N], DecodeError> {
    let too_short = || DecodeError::TooShort {
        what,
        need: offset.saturating_add(N),
        have: b.len(),
    };
    let end = offset.checked_add(N).ok_or_else(too_short)?;
    let raw = b.get(offset..end).ok_or_else(too_short)?;
    let mut ret = [0_u8; N];
    ret.copy_from_slice(raw);
    Ok(ret)
}

#[inline]
fn read_u16(b: &[u8], offset: usize, what: &'static str) -> Result<u16, DecodeError> {
    field::<2>(b, offset, what).map(u16::from_ne_bytes)
}

#[inline]
fn read_u32(b: &[u8], offset: usize, what: &'static str) -> Result<u32, DecodeError> {
    field::<4>(b, offset, what).map(u32::from_ne_bytes)
}

#[inline]
fn read_u64(b: &[u8], offset: usize, what: &'static str) -> Result<u64, DecodeError> {
    field::<8>(b, offset, what).map(u64::from_ne_bytes)
}

/// Decode a fixed-size, NUL-padded text field: everything before the first
/// zero byte, or the whole field if there is none.
pub fn nul_terminated(raw: &[u8]) -> String {
    let len = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

/// The only `IN_FORMATS` blob layout version the kernel has defined.
pub const FORMAT_MODIFIER_BLOB_VERSION: u32 = 1;

const HDR_VERSION: usize = 0;
const HDR_FLAGS: usize = 4;
const HDR_COUNT_FORMATS: usize = 8;
const HDR_FORMATS_OFFSET: usize = 12;
const HDR_COUNT_MODIFIERS: usize = 16;
const HDR_MODIFIERS_OFFSET: usize = 20;
const HDR_SIZE: usize = 24;

const MOD_FORMATS: usize = 0;
const MOD_OFFSET: usize = 8;
// 4 bytes of padding at offset 12
const MOD_MODIFIER: usize = 16;
const MOD_SIZE: usize = 24;

/// One entry of a format modifier blob: `formats` selects up to 64
/// consecutive entries of the format array starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormatModifierEntry {
    pub formats: u64,
    pub offset: u32,
    pub modifier: Modifier,
}

impl FormatModifierEntry {
    /// Indices into the format array selected by this entry, ascending.
    fn format_indices(&self) -> impl Iterator<Item = u64> + '_ {
        (0..64_u64)
            .filter(move |bit| self.formats & (1_u64 << *bit) != 0)
            .map(move |bit| self.offset as u64 + bit)
    }
}

/// The decoded contents of an `IN_FORMATS` blob.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormatModifierSet {
    pub version: u32,
    pub flags: u32,
    pub formats: Vec<Format>,
    pub modifiers: Vec<FormatModifierEntry>,
}

impl FormatModifierSet {
    pub fn parse(b: &[u8]) -> Result<Self, DecodeError> {
        const WHAT: &str = "format modifier blob";
        if b.len() < HDR_SIZE {
            return Err(DecodeError::TooShort {
                what: WHAT,
                need: HDR_SIZE,
                have: b.len(),
            });
        }
        let version = read_u32(b, HDR_VERSION, WHAT)?;
        if version != FORMAT_MODIFIER_BLOB_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let flags = read_u32(b, HDR_FLAGS, WHAT)?;
        let count_formats = read_u32(b, HDR_COUNT_FORMATS, WHAT)? as usize;
        let formats_offset = read_u32(b, HDR_FORMATS_OFFSET, WHAT)? as usize;
        let count_modifiers = read_u32(b, HDR_COUNT_MODIFIERS, WHAT)? as usize;
        let modifiers_offset = read_u32(b, HDR_MODIFIERS_OFFSET, WHAT)? as usize;

        check_region(b, formats_offset, count_formats, 4, WHAT)?;
        check_region(b, modifiers_offset, count_modifiers, MOD_SIZE, WHAT)?;

        let mut formats = Vec::with_capacity(count_formats);
        for i in 0..count_formats {
            formats.push(Format(read_u32(b, formats_offset + i * 4, WHAT)?));
        }

        let mut modifiers = Vec::with_capacity(count_modifiers);
        for i in 0..count_modifiers {
            let base = modifiers_offset + i * MOD_SIZE;
            let entry = FormatModifierEntry {
                formats: read_u64(b, base + MOD_FORMATS, WHAT)?,
                offset: read_u32(b, base + MOD_OFFSET, WHAT)?,
                modifier: Modifier(read_u64(b, base + MOD_MODIFIER, WHAT)?),
            };
            if let Some(index) = entry.format_indices().last() {
                if index >= count_formats as u64 {
                    return Err(DecodeError::FormatIndexOutOfRange {
                        modifier: entry.modifier.0,
                        index,
                        count: count_formats,
                    });
                }
            }
            modifiers.push(entry);
        }

        Ok(Self {
            version,
            flags,
            formats,
            modifiers,
        })
    }

    /// The formats supported with each modifier, in the order the blob
    /// lists them.
    pub fn to_map(&self) -> BTreeMap<Modifier, Vec<Format>> {
        let mut ret = BTreeMap::new();
        for entry in &self.modifiers {
            // parse checked every index against the format array
            let formats = entry
                .format_indices()
                .map(|i| self.formats[i as usize])
                .collect();
            ret.insert(entry.modifier, formats);
        }
        ret
    }
}

fn check_region(
    b: &[u8],
    offset: usize,
    count: usize,
    element_size: usize,
    what: &'static str,
) -> Result<(), DecodeError> {
    let end = count
        .checked_mul(element_size)
        .and_then(|len| len.checked_add(offset));
    match end {
        Some(end) if end <= b.len() => Ok(()),
        _ => Err(DecodeError::TooShort {
            what,
            need: end.unwrap_or(usize::MAX),
            have: b.len(),
        }),
    }
}

/// Size of the kernel's `drm_mode_modeinfo` record.
pub const MODE_INFO_SIZE: usize = 68;

const MI_CLOCK: usize = 0;
const MI_HDISPLAY: usize = 4;
const MI_HSYNC_START: usize = 6;
const MI_HSYNC_END: usize = 8;
const MI_HTOTAL: usize = 10;
const MI_HSKEW: usize = 12;
const MI_VDISPLAY: usize = 14;
const MI_VSYNC_START: usize = 16;
const MI_VSYNC_END: usize = 18;
const MI_VTOTAL: usize = 20;
const MI_VSCAN: usize = 22;
const MI_VREFRESH: usize = 24;
const MI_FLAGS: usize = 28;
const MI_TYPE: usize = 32;
const MI_NAME: usize = 36;

/// Decode a blob holding exactly one mode, as used by `MODE_ID`.
pub fn parse_mode_info(b: &[u8]) -> Result<ModeInfo, DecodeError> {
    const WHAT: &str = "mode info blob";
    if b.len() != MODE_INFO_SIZE {
        return Err(DecodeError::WrongLength {
            what: WHAT,
            need: MODE_INFO_SIZE,
            have: b.len(),
        });
    }
    let name = field::<DRM_DISPLAY_MODE_LEN>(b, MI_NAME, WHAT)?;
    Ok(ModeInfo {
        name: nul_terminated(&name),
        clock: read_u32(b, MI_CLOCK, WHAT)?,
        hdisplay: read_u16(b, MI_HDISPLAY, WHAT)?,
        hsync_start: read_u16(b, MI_HSYNC_START, WHAT)?,
        hsync_end: read_u16(b, MI_HSYNC_END, WHAT)?,
        htotal: read_u16(b, MI_HTOTAL, WHAT)?,
        hskew: read_u16(b, MI_HSKEW, WHAT)?,
        vdisplay: read_u16(b, MI_VDISPLAY, WHAT)?,
        vsync_start: read_u16(b, MI_VSYNC_START, WHAT)?,
        vsync_end: read_u16(b, MI_VSYNC_END, WHAT)?,
        vtotal: read_u16(b, MI_VTOTAL, WHAT)?,
        vscan: read_u16(b, MI_VSCAN, WHAT)?,
        vrefresh: read_u32(b, MI_VREFRESH, WHAT)?,
        flags: read_u32(b, MI_FLAGS, WHAT)?,
        typ: read_u32(b, MI_TYPE, WHAT)?,
    })
}

/// Decode a flat array of format codes, as used by
/// `WRITEBACK_PIXEL_FORMATS`.
pub fn parse_formats(b: &[u8]) -> Result<Vec<Format>, DecodeError> {
    if b.len() % 4 != 0 {
        return Err(DecodeError::Misaligned {
            what: "pixel format blob",
            element_size: 4,
            have: b.len(),
        });
    }
    Ok(b
        .chunks_exact(4)
        .map(|c| Format(u32::from_ne_bytes([c[0], c[1], c[2], c[3]])))
        .collect())
}

/// Decode a text blob such as a connector's `PATH`.
pub fn parse_path(b: &[u8]) -> String {
    nul_terminated(b)
}
