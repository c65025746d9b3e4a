//! UseCase: 画面共有の開始・停止
//!
//! 画面共有は、共有者の接続 ID から決まる ID を持つ仮想メンバーとして Room に追加されます。
//! 他の参加者は通常のピアと同じようにこの仮想メンバーとネゴシエーションします。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, DisplayName, Member, MemberId, Notification,
    RoomRepository,
};

use super::{broadcaster::EventBroadcaster, error::RequestError};

/// 名前が指定されなかった画面共有メンバーの表示名
pub const SCREEN_SHARE_NAME: &str = "Screen";

#[derive(Clone)]
pub struct ScreenShareUseCase {
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
}

impl ScreenShareUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        connections: Arc<dyn ConnectionRepository>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            rooms,
            connections,
            broadcaster,
        }
    }

    /// 画面共有を開始する
    ///
    /// 既に共有中の場合は仮想メンバーを置き換え、`user-connected` は再送しない。
    ///
    /// # Returns
    ///
    /// * `Ok(Some(MemberId))` - 仮想メンバーの ID
    /// * `Ok(None)` - Room に参加していない
    pub async fn start(
        &self,
        from: &ConnectionId,
        name: Option<String>,
    ) -> Result<Option<MemberId>, RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring start-sharing from '{}': not in a room", from);
            return Ok(None);
        };
        let room_id = binding.room_id;

        let screen = Member::screen_share(from, DisplayName::parse_or(name, SCREEN_SHARE_NAME));
        let replaced = self.rooms.upsert_member(&room_id, screen.clone()).await?;

        // 1. 本人に仮想メンバーの ID を通知（ネゴシエーション開始の前提）
        self.broadcaster
            .send_to(
                from,
                &Notification::SharingStarted {
                    screen_share_id: screen.id.clone(),
                },
            )
            .await;

        // 2. 他のメンバーに新しいピアを通知
        if replaced.is_none() {
            self.broadcaster
                .to_others(
                    &room_id,
                    from,
                    &Notification::UserConnected {
                        id: screen.id.clone(),
                        name: screen.name.clone(),
                    },
                )
                .await;
            tracing::info!("'{}' started sharing in room '{}'", from, room_id);
        }

        // 3. 全員にメンバー一覧
        self.broadcaster.member_list(&room_id).await;
        Ok(Some(screen.id))
    }

    /// 画面共有を停止する（共有していなければ何もしない）
    pub async fn stop(&self, from: &ConnectionId) -> Result<Option<MemberId>, RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring stop-sharing from '{}': not in a room", from);
            return Ok(None);
        };
        let room_id = binding.room_id;

        let Some(screen) = self.rooms.find_screen_share(&room_id, from).await? else {
            tracing::debug!("'{}' is not sharing", from);
            return Ok(None);
        };
        self.rooms.remove_member(&room_id, &screen.id).await?;

        self.broadcaster
            .to_room(&room_id, &Notification::UserDisconnected(screen.id.clone()))
            .await;
        self.broadcaster.member_list(&room_id).await;

        tracing::info!("'{}' stopped sharing in room '{}'", from, room_id);
        Ok(Some(screen.id))
    }
}
