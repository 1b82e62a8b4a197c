//! The two-phase protocol for kernel requests that return arrays.
//!
//! The kernel has no snapshot transactions for modesetting state, so a
//! request that returns arrays is made twice: once with every capacity set to
//! zero to learn the array lengths, and once more with buffers of exactly
//! those lengths attached. If any length differs between the two calls then
//! the kernel state changed in between (a hotplug, for example) and the whole
//! sequence starts over.

use alloc::vec::Vec;

use crate::result::Error;

/// Limits for the two-phase protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QueryConfig {
    /// Number of complete size-then-fetch sequences to attempt before giving
    /// up with [`Error::Unstable`]. Zero is treated as one.
    pub max_attempts: u32,
}

impl QueryConfig {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// A request record that reports the lengths of one or more arrays and can
/// have buffers for those arrays attached.
pub trait ArrayRequest: Sized {
    /// The array lengths reported by the kernel, in a fixed order.
    type Lengths: Copy + PartialEq + core::fmt::Debug;

    /// Owned storage for every array this request returns.
    type Buffers;

    /// A fresh request with every array capacity set to zero.
    fn sizing(&self) -> Self;

    fn lengths(&self) -> Self::Lengths;

    /// Allocate zero-filled buffers exactly matching [`Self::lengths`].
    fn allocate(&self) -> Result<Self::Buffers, Error>;

    /// Point the request's array fields at `buffers`.
    ///
    /// # Safety
    ///
    /// The caller must not move, resize, or drop any buffer while the
    /// request may still be passed to the kernel.
    unsafe fn attach(&mut self, buffers: &mut Self::Buffers);
}

/// Run the two-phase protocol for `template`, issuing each call through
/// `call`.
///
/// On success the returned request holds the scalar fields from the second
/// call and the buffers hold exactly the lengths that call reported.
pub fn fetch<Req, F>(
    config: &QueryConfig,
    template: &Req,
    mut call: F,
) -> Result<(Req, Req::Buffers), Error>
where
    Req: ArrayRequest,
    F: FnMut(&mut Req) -> Result<(), Error>,
{
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let mut req = template.sizing();
        call(&mut req)?;
        let want = req.lengths();

        let mut buffers = req.allocate()?;
        // Safety: buffers outlives the call below and is not touched until
        // after it returns.
        unsafe { req.attach(&mut buffers) };
        call(&mut req)?;

        let got = req.lengths();
        if got == want {
            return Ok((req, buffers));
        }
        log::debug!(
            "array lengths changed from {want:?} to {got:?} during query \
             (attempt {attempt}/{attempts}), retrying"
        );
    }
    Err(Error::Unstable { attempts })
}

/// A vector of `len` copies of `fill`, reporting allocation failure as
/// [`Error::SystemMem`] instead of aborting.
pub(crate) fn filled_vec<T: Clone>(len: u32, fill: T) -> Result<Vec<T>, Error> {
    let len = len as usize;
    let mut ret = Vec::new();
    ret.try_reserve_exact(len)?;
    ret.resize(len, fill);
    Ok(ret)
}
