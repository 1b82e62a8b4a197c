//! Identification of PCI display devices.
//!
//! Linux publishes a PCI device's identifiers as sysfs attributes under
//! `/sys/dev/char/{major}:{minor}/device/`, each containing a `0x`-prefixed
//! hexadecimal number. This module decodes the attribute text; finding and
//! reading the files is up to the caller.

use core::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PciIdentity {
    pub vendor: u32,
    pub device: u32,
    pub subvendor: u32,
    pub subdevice: u32,
}

impl PciIdentity {
    /// The sysfs attribute names, in field order.
    pub const ATTRIBUTES: [&'static str; 4] =
        ["vendor", "device", "subsystem_vendor", "subsystem_device"];

    /// Build an identity from the text of the four sysfs attributes, given
    /// in the order of [`Self::ATTRIBUTES`].
    pub fn from_sysfs_attributes(attrs: [&str; 4]) -> Result<Self, ParseIdError> {
        let [vendor, device, subvendor, subdevice] = attrs;
        Ok(Self {
            vendor: parse_sysfs_hex(vendor)?,
            device: parse_sysfs_hex(device)?,
            subvendor: parse_sysfs_hex(subvendor)?,
            subdevice: parse_sysfs_hex(subdevice)?,
        })
    }
}

impl fmt::Display for PciIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor, self.device)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseIdError {
    #[error("missing 0x prefix")]
    MissingPrefix,
    #[error("invalid hexadecimal number")]
    InvalidNumber,
}

/// Parse a single `0x`-prefixed hex attribute value, ignoring surrounding
/// whitespace such as the trailing newline sysfs adds.
pub fn parse_sysfs_hex(s: &str) -> Result<u32, ParseIdError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(ParseIdError::MissingPrefix)?;
    u32::from_str_radix(digits, 16).map_err(|_| ParseIdError::InvalidNumber)
}
