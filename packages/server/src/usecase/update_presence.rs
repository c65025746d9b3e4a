//! UseCase: プレゼンス（カメラ・マイク・挙手）の更新
//!
//! Room に参加していない場合や、対象メンバーが存在しない場合は何もしません。
//! 状態更新は切断と競合しうるため、エラーとして扱いません。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, MemberId, MemberStatus, Notification, RoomRepository,
};

use super::{broadcaster::EventBroadcaster, error::RequestError};

#[derive(Clone)]
pub struct UpdatePresenceUseCase {
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
}

impl UpdatePresenceUseCase {
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

    /// カメラ状態・マイク状態を部分更新する
    ///
    /// 指定されなかった項目は変更しない。仮想画面共有メンバーの状態は固定。
    pub async fn update_status(
        &self,
        from: &ConnectionId,
        member_id: String,
        status: Option<MemberStatus>,
        audio_on: Option<bool>,
    ) -> Result<(), RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring status update from '{}': not in a room", from);
            return Ok(());
        };
        let Ok(member_id) = MemberId::new(member_id) else {
            return Ok(());
        };
        let Some(mut member) = self.rooms.find_member(&binding.room_id, &member_id).await? else {
            tracing::debug!("Ignoring status update for unknown member '{}'", member_id);
            return Ok(());
        };
        let Some(presence) = member.presence_mut() else {
            tracing::debug!("Ignoring status update for screen share '{}'", member_id);
            return Ok(());
        };
        if status.is_none() && audio_on.is_none() {
            return Ok(());
        }

        // sharing は仮想メンバー専用
        if let Some(status) = status.filter(|s| *s != MemberStatus::Sharing) {
            presence.status = status;
        }
        if let Some(audio_on) = audio_on {
            presence.audio_on = Some(audio_on);
        }
        let current_status = presence.status;
        self.rooms.upsert_member(&binding.room_id, member).await?;

        if status.is_some() {
            self.broadcaster
                .to_room(
                    &binding.room_id,
                    &Notification::PeerStatusUpdate {
                        id: member_id.clone(),
                        status: current_status,
                    },
                )
                .await;
        }
        if let Some(audio_on) = audio_on {
            self.broadcaster
                .to_room(
                    &binding.room_id,
                    &Notification::PeerAudioUpdate {
                        id: member_id,
                        audio_on,
                    },
                )
                .await;
        }
        self.broadcaster.member_list(&binding.room_id).await;
        Ok(())
    }

    /// 自分の挙手状態を更新する
    pub async fn raise_hand(&self, from: &ConnectionId, raised: bool) -> Result<(), RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring raiseHand from '{}': not in a room", from);
            return Ok(());
        };
        let Some(mut member) = self
            .rooms
            .find_member(&binding.room_id, &MemberId::from(from))
            .await?
        else {
            return Ok(());
        };
        if let Some(presence) = member.presence_mut() {
            presence.hand_raised = raised;
        }
        self.rooms.upsert_member(&binding.room_id, member).await?;

        tracing::debug!("'{}' hand raised: {}", from, raised);
        self.broadcaster.member_list(&binding.room_id).await;
        Ok(())
    }
}
