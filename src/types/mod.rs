// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent id confusion at compile time.

mod id;
mod image_ref;

pub use id::{ContainerId, Id, ImageId, SHORT_ID_LEN};
pub use image_ref::{DEFAULT_TAG, ImageRef, ParseImageRefError};
