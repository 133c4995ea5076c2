//! Order intake and lifecycle
//!
//! - **sequence**: per (branch, day) order ID counter
//! - **items**: request line item normalization
//! - **store**: persistence seam over the order repository
//! - **controller**: scoped create / list / status transitions + realtime notify
//!
//! ```text
//! POST /api/orders → OrderController::create
//!                        ├─ normalize_items
//!                        ├─ OrderStore::create ─ OrderSequence::next_order_id
//!                        └─ RealtimePublisher::broadcast([branch:<code>, admins])
//! ```

pub mod controller;
pub mod items;
pub mod sequence;
pub mod store;

pub use controller::{OrderController, OrderListQuery, Scope};
pub use items::normalize_items;
pub use sequence::OrderSequence;
pub use store::{NewOrder, OrderStore, SqliteOrderStore};
