//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Access token verification and hosted sign-in/sign-up
//! - `ids` - Client ids, order numbers and upload object names
//! - `pricing` - Coupon discounts and markdown labels
//! - `rules` - Ownership checks, input bounds and status transitions
//! - `scoring` - Craft work scoring and grading
//! - `storage` - Hosted or local file storage

pub mod auth;
pub mod ids;
pub mod pricing;
pub mod rules;
pub mod scoring;
pub mod storage;

pub use auth::{AuthError, AuthService, AuthUser};
pub use storage::{FileStorage, StorageError};
