// ABOUTME: Sealed trait pattern for engine capability traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Only types inside this crate can implement the engine traits, so new
/// methods can be added without breaking downstream code.
pub trait Sealed {}
