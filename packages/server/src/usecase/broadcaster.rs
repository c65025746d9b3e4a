//! Event Broadcaster
//!
//! Room 単位の通知を配信します。Room やメンバーの状態は読むだけで所有しません。
//! 配信は fire-and-forget で、失敗はログに出力するだけで呼び出し元には返しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, Notification, RoomId, RoomRepository};

#[derive(Clone)]
pub struct EventBroadcaster {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl EventBroadcaster {
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    /// 特定の接続に送信
    pub async fn send_to(&self, target: &ConnectionId, notification: &Notification) {
        if let Err(e) = self.message_pusher.push_to(target, notification).await {
            tracing::warn!(
                "Failed to deliver '{}' to '{}': {}",
                notification.event_name(),
                target,
                e
            );
        }
    }

    /// 指定した接続群に送信
    pub async fn send_to_all(&self, targets: Vec<ConnectionId>, notification: &Notification) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, notification).await {
            tracing::warn!("Failed to broadcast '{}': {}", notification.event_name(), e);
        }
    }

    /// Room の全メンバー（送信者を含む）に送信
    pub async fn to_room(&self, room_id: &RoomId, notification: &Notification) {
        let targets = self.room_connections(room_id).await;
        self.send_to_all(targets, notification).await;
    }

    /// Room の `exclude` 以外のメンバーに送信
    pub async fn to_others(
        &self,
        room_id: &RoomId,
        exclude: &ConnectionId,
        notification: &Notification,
    ) {
        let targets = self
            .room_connections(room_id)
            .await
            .into_iter()
            .filter(|id| id != exclude)
            .collect();
        self.send_to_all(targets, notification).await;
    }

    /// 現在のメンバー一覧を Room の全員に送信
    pub async fn member_list(&self, room_id: &RoomId) {
        match self.rooms.get_members(room_id).await {
            Ok(members) => {
                let targets = members
                    .iter()
                    .filter_map(|m| m.connection())
                    .cloned()
                    .collect();
                self.send_to_all(targets, &Notification::MemberList(members))
                    .await;
            }
            Err(e) => tracing::debug!("Skipping member list for '{}': {}", room_id, e),
        }
    }

    async fn room_connections(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        match self.rooms.get_room(room_id).await {
            Ok(room) => room.connections(),
            Err(e) => {
                tracing::debug!("No recipients in '{}': {}", room_id, e);
                Vec::new()
            }
        }
    }
}
