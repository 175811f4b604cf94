//! Row and view types.
//!
//! Rows derive `sqlx::FromRow` for the repositories and `Serialize` for the
//! JSON envelope. Views add computed fields on top of a row.

pub mod cart;
pub mod course;
pub mod game;
pub mod order;
pub mod product;
pub mod profile;
pub mod session;
pub mod task;

pub use cart::{CartLine, CartLineView, CartView};
pub use course::{Comment, Course, Enrollment, EnrolledCourse};
pub use game::{CraftWork, InventoryItem, Item, LeaderboardEntry, Listing, ListingView};
pub use order::{Coupon, Order, OrderDetail, OrderItem, ShippingAddress};
pub use product::{Product, ProductView};
pub use profile::{Profile, Transaction, Wallet};
pub use session::{SessionTokens, keys as session_keys};
pub use task::TaskProgress;
