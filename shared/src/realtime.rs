//! Realtime channel wire types
//!
//! Every frame on the socket is a JSON object `{"event": <name>, "data": <payload>}`.
//! Order lifecycle events go out under two names each (`order-created` and
//! `order:created`) so dashboards of both generations keep working.

use crate::models::Order;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single frame as sent to a subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Server-to-client event
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    OrderCreated(Order),
    OrderUpdated(Order),
}

impl RealtimeEvent {
    /// Every wire name this event is emitted under
    pub const fn wire_names(&self) -> [&'static str; 2] {
        match self {
            Self::OrderCreated(_) => ["order-created", "order:created"],
            Self::OrderUpdated(_) => ["order-updated", "order:updated"],
        }
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::OrderCreated(order) | Self::OrderUpdated(order) => order,
        }
    }

    /// Expand into the frames delivered to each subscriber
    pub fn frames(&self) -> serde_json::Result<Vec<Frame>> {
        let data = serde_json::to_value(self.order())?;
        Ok(self
            .wire_names()
            .iter()
            .map(|name| Frame::new(*name, data.clone()))
            .collect())
    }
}

/// Client-to-server control message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientCommand {
    JoinBranch(String),
    JoinAdmins,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, PaymentMode};

    fn order() -> Order {
        Order {
            order_id: "BR01-20250614-0001".into(),
            branch_code: "BR01".into(),
            items: vec![],
            total_amount: 0.0,
            payment_mode: PaymentMode::Cash,
            status: OrderStatus::Ongoing,
            created_by: 1,
            created_at: 0,
            updated_at: 0,
            completed_at: None,
        }
    }

    #[test]
    fn test_frames_carry_both_names() {
        let frames = RealtimeEvent::OrderCreated(order()).frames().unwrap();
        let names: Vec<_> = frames.iter().map(|f| f.event.as_str()).collect();
        assert_eq!(names, ["order-created", "order:created"]);
        assert_eq!(frames[0].data["orderId"], "BR01-20250614-0001");
        assert_eq!(frames[0].data, frames[1].data);
    }

    #[test]
    fn test_updated_names() {
        let event = RealtimeEvent::OrderUpdated(order());
        assert_eq!(event.wire_names(), ["order-updated", "order:updated"]);
    }

    #[test]
    fn test_client_command_parse() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"event":"join-branch","data":"BR01"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::JoinBranch("BR01".into()));

        let cmd: ClientCommand = serde_json::from_str(r#"{"event":"join-admins"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::JoinAdmins);

        assert!(serde_json::from_str::<ClientCommand>(r#"{"event":"leave"}"#).is_err());
    }
}
