use core::fmt;

/// A pixel format code, as a little-endian "four character code".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Format(pub u32);

impl Format {
    pub const XRGB8888: Self = Self::fourcc(b'X', b'R', b'2', b'4');
    pub const ARGB8888: Self = Self::fourcc(b'A', b'R', b'2', b'4');
    pub const XBGR8888: Self = Self::fourcc(b'X', b'B', b'2', b'4');
    pub const ABGR8888: Self = Self::fourcc(b'A', b'B', b'2', b'4');
    pub const RGB565: Self = Self::fourcc(b'R', b'G', b'1', b'6');
    pub const NV12: Self = Self::fourcc(b'N', b'V', b'1', b'2');

    pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self((a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24))
    }

    /// The four characters of the code, least significant byte first.
    #[inline]
    pub fn chars(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.chars() {
            fmt::Write::write_char(f, char::from(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format({self} {:#010x})", self.0)
    }
}

impl From<u32> for Format {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A format modifier describing a vendor-specific memory layout.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Modifier(pub u64);

impl Modifier {
    pub const LINEAR: Self = Self(0);
    pub const INVALID: Self = Self(0x00ff_ffff_ffff_ffff);

    /// The vendor code from the top eight bits.
    #[inline]
    pub fn vendor(self) -> u8 {
        (self.0 >> 56) as u8
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifier({:#018x})", self.0)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
