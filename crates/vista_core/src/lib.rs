//! # vista_core - Vista Core
//!
//! Leaf primitives shared by every Vista crate:
//! - **Identifiers**: opaque viewport and surface handles plus their generators
//! - **Colors**: linear RGBA values used by viewport, grid, and overlay configuration
//! - **Errors**: [`CoreError`] for malformed primitive values

pub mod id;
pub mod color;
pub mod error;

pub use id::*;
pub use color::*;
pub use error::CoreError;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{ViewportId, SurfaceId, IdGenerator};
    pub use crate::color::Color;
    pub use crate::error::CoreError;
}
