//! Concrete test problems.

/// Brown's badly scaled function.
mod brown;

pub use brown::{BrownBadlyScaled, brown_badly_scaled};
