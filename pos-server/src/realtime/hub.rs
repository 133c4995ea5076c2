//! RealtimeHub — 订单事件房间分发
//!
//! 每个连接是一个订阅者，持有一个有界队列；房间只记录订阅者 ID。
//!
//! ```text
//! OrderController ── persist ──▶ SQLite
//!        │ broadcast([branch:BR01, admins], OrderCreated)
//!        ▼
//! RealtimeHub
//!   ├── rooms: Room → {subscriber id}
//!   └── subscribers: id → mpsc::Sender<Arc<str>> (bounded)
//!          │
//!          ▼
//!   WS session (drain queue → socket)
//! ```
//!
//! 发布永不阻塞：队列满或已关闭时，该订阅者丢弃此事件并记录日志。

use dashmap::{DashMap, DashSet};
use serde::Deserialize;
use shared::realtime::RealtimeEvent;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// 每个订阅者队列的默认容量 (帧数)
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

pub type SubscriberId = u64;

/// 房间
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    /// `branch:<branchCode>`
    Branch(String),
    /// `admins`
    Admins,
}

impl Room {
    pub fn branch(code: impl Into<String>) -> Self {
        Self::Branch(code.into())
    }

    /// 订单事件的目标房间
    pub fn for_order(branch_code: &str) -> [Room; 2] {
        [Self::branch(branch_code), Self::Admins]
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(code) => write!(f, "branch:{}", code),
            Self::Admins => f.write_str("admins"),
        }
    }
}

/// 连接握手参数 (`/ws?branchCode=&role=`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub branch_code: Option<String>,
    pub role: Option<String>,
}

impl Handshake {
    /// 握手时自动加入的房间
    pub fn rooms(&self) -> Vec<Room> {
        let mut rooms = Vec::with_capacity(2);
        if let Some(code) = self.branch_code.as_deref().and_then(meaningful_branch) {
            rooms.push(Room::branch(code));
        }
        if self.role.as_deref() == Some("admin") {
            rooms.push(Room::Admins);
        }
        rooms
    }
}

/// 客户端会把未设置的变量序列化成 "undefined" / "null"
fn meaningful_branch(code: &str) -> Option<&str> {
    let code = code.trim();
    match code {
        "" | "undefined" | "null" => None,
        _ => Some(code),
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode realtime event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 事件发布接口
///
/// 返回值为实际入队的订阅者数量。
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, room: &Room, event: &RealtimeEvent) -> Result<usize, PublishError>;

    /// 对多个房间的并集投递，每个订阅者只收到一次
    fn broadcast(&self, rooms: &[Room], event: &RealtimeEvent) -> Result<usize, PublishError>;
}

/// `connect` 返回的句柄；`rx` 里是已编码的 JSON 帧
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub rx: mpsc::Receiver<Arc<str>>,
}

#[derive(Debug)]
struct Subscriber {
    tx: mpsc::Sender<Arc<str>>,
    rooms: DashSet<Room>,
}

/// 实时事件 hub
///
/// 两个 map 之间从不同时持有锁：先收集 ID，释放，再查另一个 map。
#[derive(Debug)]
pub struct RealtimeHub {
    next_id: AtomicU64,
    capacity: usize,
    subscribers: DashMap<SubscriberId, Subscriber>,
    rooms: DashMap<Room, DashSet<SubscriberId>>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            subscribers: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// 注册新订阅者并按握手参数自动入房
    pub fn connect(&self, handshake: &Handshake) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(
            id,
            Subscriber {
                tx,
                rooms: DashSet::new(),
            },
        );

        for room in handshake.rooms() {
            self.join(id, room);
        }

        tracing::debug!(
            subscriber = id,
            branch_code = ?handshake.branch_code,
            role = ?handshake.role,
            "Realtime subscriber connected"
        );
        Subscription { id, rx }
    }

    /// 加入房间；返回是否为新加入 (重复加入是 no-op)
    pub fn join(&self, id: SubscriberId, room: Room) -> bool {
        let newly_joined = match self.subscribers.get(&id) {
            Some(sub) => sub.rooms.insert(room.clone()),
            None => return false,
        };
        if newly_joined {
            tracing::debug!(subscriber = id, room = %room, "Joined room");
        }
        self.rooms.entry(room).or_default().insert(id);
        newly_joined
    }

    /// `join-branch`，忽略空值和 "undefined" / "null"
    pub fn join_branch(&self, id: SubscriberId, branch_code: &str) -> bool {
        match meaningful_branch(branch_code) {
            Some(code) => self.join(id, Room::branch(code)),
            None => false,
        }
    }

    /// `join-admins`
    pub fn join_admins(&self, id: SubscriberId) -> bool {
        self.join(id, Room::Admins)
    }

    /// 移除订阅者及其全部房间成员关系
    pub fn disconnect(&self, id: SubscriberId) {
        let Some((_, sub)) = self.subscribers.remove(&id) else {
            return;
        };

        let rooms: Vec<Room> = sub.rooms.iter().map(|r| r.key().clone()).collect();
        for room in rooms {
            if let Some(members) = self.rooms.get(&room) {
                members.remove(&id);
            }
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }

        tracing::debug!(subscriber = id, "Realtime subscriber disconnected");
    }

    /// 房间当前成员
    pub fn members(&self, room: &Room) -> Vec<SubscriberId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// 订阅者当前所在房间
    pub fn rooms_of(&self, id: SubscriberId) -> Vec<Room> {
        let mut rooms: Vec<Room> = self
            .subscribers
            .get(&id)
            .map(|sub| sub.rooms.iter().map(|r| r.key().clone()).collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn encode(event: &RealtimeEvent) -> Result<Vec<Arc<str>>, PublishError> {
        event
            .frames()?
            .iter()
            .map(|frame| serde_json::to_string(frame).map(Arc::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PublishError::from)
    }

    fn deliver(&self, ids: impl IntoIterator<Item = SubscriberId>, frames: &[Arc<str>]) -> usize {
        let mut delivered = 0;
        for id in ids {
            let Some(tx) = self.subscribers.get(&id).map(|sub| sub.tx.clone()) else {
                continue;
            };

            let mut accepted = true;
            for frame in frames {
                match tx.try_send(frame.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(subscriber = id, "Realtime queue full, dropping event");
                        accepted = false;
                        break;
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(subscriber = id, "Realtime queue closed, dropping event");
                        accepted = false;
                        break;
                    }
                }
            }
            if accepted {
                delivered += 1;
            }
        }
        delivered
    }
}

impl RealtimePublisher for RealtimeHub {
    fn publish(&self, room: &Room, event: &RealtimeEvent) -> Result<usize, PublishError> {
        let frames = Self::encode(event)?;
        Ok(self.deliver(self.members(room), &frames))
    }

    fn broadcast(&self, rooms: &[Room], event: &RealtimeEvent) -> Result<usize, PublishError> {
        let frames = Self::encode(event)?;
        let ids: BTreeSet<SubscriberId> = rooms.iter().flat_map(|r| self.members(r)).collect();
        Ok(self.deliver(ids, &frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Order, OrderStatus, PaymentMode};
    use shared::realtime::Frame;
    use tokio::sync::mpsc::error::TryRecvError;

    fn order(branch: &str) -> Order {
        Order {
            order_id: format!("{branch}-20250614-0001"),
            branch_code: branch.into(),
            items: vec![],
            total_amount: 40.0,
            payment_mode: PaymentMode::Cash,
            status: OrderStatus::Ongoing,
            created_by: 1,
            created_at: 0,
            updated_at: 0,
            completed_at: None,
        }
    }

    fn handshake(branch: Option<&str>, role: Option<&str>) -> Handshake {
        Handshake {
            branch_code: branch.map(String::from),
            role: role.map(String::from),
        }
    }

    fn drain(sub: &mut Subscription) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(text) = sub.rx.try_recv() {
            frames.push(serde_json::from_str(&text).unwrap());
        }
        frames
    }

    #[test]
    fn test_handshake_rooms() {
        assert_eq!(
            handshake(Some("BR01"), Some("admin")).rooms(),
            vec![Room::branch("BR01"), Room::Admins]
        );
        assert_eq!(
            handshake(Some("BR01"), Some("biller")).rooms(),
            vec![Room::branch("BR01")]
        );
        assert!(handshake(Some("undefined"), None).rooms().is_empty());
        assert!(handshake(Some("null"), Some("biller")).rooms().is_empty());
        assert!(handshake(Some(""), None).rooms().is_empty());
        assert_eq!(Room::branch("BR01").to_string(), "branch:BR01");
        assert_eq!(Room::Admins.to_string(), "admins");
    }

    #[test]
    fn test_publish_reaches_only_room_members() {
        let hub = RealtimeHub::default();
        let mut br01 = hub.connect(&handshake(Some("BR01"), Some("biller")));
        let mut br02 = hub.connect(&handshake(Some("BR02"), Some("biller")));

        let delivered = hub
            .publish(
                &Room::branch("BR01"),
                &RealtimeEvent::OrderCreated(order("BR01")),
            )
            .unwrap();
        assert_eq!(delivered, 1);

        let frames = drain(&mut br01);
        let names: Vec<_> = frames.iter().map(|f| f.event.as_str()).collect();
        assert_eq!(names, vec!["order-created", "order:created"]);
        assert_eq!(frames[0].data["orderId"], "BR01-20250614-0001");

        assert!(matches!(br02.rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_broadcast_delivers_once_per_subscriber() {
        let hub = RealtimeHub::default();
        let mut both = hub.connect(&handshake(Some("BR01"), Some("admin")));
        let mut admin_only = hub.connect(&handshake(None, Some("admin")));
        let mut other_branch = hub.connect(&handshake(Some("BR02"), None));

        let delivered = hub
            .broadcast(
                &Room::for_order("BR01"),
                &RealtimeEvent::OrderUpdated(order("BR01")),
            )
            .unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(drain(&mut both).len(), 2);
        assert_eq!(drain(&mut admin_only).len(), 2);
        assert!(drain(&mut other_branch).is_empty());
    }

    #[test]
    fn test_join_is_idempotent() {
        let hub = RealtimeHub::default();
        let sub = hub.connect(&Handshake::default());
        assert!(hub.rooms_of(sub.id).is_empty());

        assert!(hub.join_branch(sub.id, "BR01"));
        assert!(!hub.join_branch(sub.id, "BR01"));
        assert!(hub.join_admins(sub.id));
        assert!(!hub.join_admins(sub.id));
        assert!(!hub.join_branch(sub.id, "undefined"));

        assert_eq!(hub.members(&Room::branch("BR01")), vec![sub.id]);
        assert_eq!(
            hub.rooms_of(sub.id),
            vec![Room::branch("BR01"), Room::Admins]
        );
    }

    #[test]
    fn test_join_unknown_subscriber() {
        let hub = RealtimeHub::default();
        assert!(!hub.join_admins(42));
        assert!(hub.members(&Room::Admins).is_empty());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        // Two frames per event, so one event fills a queue of two
        let hub = RealtimeHub::new(2);
        let mut sub = hub.connect(&handshake(Some("BR01"), None));
        let room = Room::branch("BR01");

        assert_eq!(
            hub.publish(&room, &RealtimeEvent::OrderCreated(order("BR01")))
                .unwrap(),
            1
        );
        assert_eq!(
            hub.publish(&room, &RealtimeEvent::OrderUpdated(order("BR01")))
                .unwrap(),
            0
        );

        let frames = drain(&mut sub);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.event.contains("created")));
    }

    #[test]
    fn test_closed_queue_is_skipped() {
        let hub = RealtimeHub::default();
        let sub = hub.connect(&handshake(Some("BR01"), None));
        drop(sub.rx);

        let delivered = hub
            .publish(
                &Room::branch("BR01"),
                &RealtimeEvent::OrderCreated(order("BR01")),
            )
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_disconnect_leaves_all_rooms() {
        let hub = RealtimeHub::default();
        let sub = hub.connect(&handshake(Some("BR01"), Some("admin")));
        let other = hub.connect(&handshake(Some("BR01"), None));
        assert_eq!(hub.subscriber_count(), 2);

        hub.disconnect(sub.id);
        assert_eq!(hub.subscriber_count(), 1);
        assert!(hub.members(&Room::Admins).is_empty());
        assert_eq!(hub.members(&Room::branch("BR01")), vec![other.id]);

        // disconnecting twice is harmless
        hub.disconnect(sub.id);
        hub.disconnect(other.id);
        assert!(hub.members(&Room::branch("BR01")).is_empty());
    }
}
