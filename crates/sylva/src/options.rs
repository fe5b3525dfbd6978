/// Compile-time tree configuration.
///
/// Implement it on a zero-sized type and override the constants you need.
pub trait TreeOptions {
    /// Allow nodes that compare equal. New duplicates go after existing ones.
    const MULTIPLE: bool = true;
    /// Keep a node count so `size` is O(1).
    const CONSTANT_TIME_SIZE: bool = true;
    /// Verify every invariant after each mutation and panic on failure.
    const DEBUG_VERIFY: bool = false;
    /// Weight-balanced `DELTA` as `(numerator, denominator)`.
    const WBT_DELTA: (u64, u64) = (3, 1);
    /// Weight-balanced `GAMMA` as `(numerator, denominator)`.
    const WBT_GAMMA: (u64, u64) = (2, 1);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultOptions;

impl TreeOptions for DefaultOptions {}

/// Rejects equal keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UniqueOptions;

impl TreeOptions for UniqueOptions {
    const MULTIPLE: bool = false;
}

/// Default options plus verification after every mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerifiedOptions;

impl TreeOptions for VerifiedOptions {
    const DEBUG_VERIFY: bool = true;
}
