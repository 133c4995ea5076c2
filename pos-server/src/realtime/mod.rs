//! Realtime order fan-out
//!
//! - **hub**: room membership and per-subscriber queues
//! - **ws**: WebSocket transport feeding the hub's queues to browsers

pub mod hub;
pub mod ws;

pub use hub::{Handshake, PublishError, RealtimeHub, RealtimePublisher, Room, Subscription};
