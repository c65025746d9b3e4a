//! UseCase: Room への参加
//!
//! 参加は 2 段階で行います。
//!
//! - `execute` / `admit`: 検証とメンバーシップの確定（確定するまで何も配信しない）
//! - `announce`: 確定後の通知（チャット履歴、メンバー一覧、`user-connected`）
//!
//! 応答（ack）と `existing-users` は呼び出し側が `announce` の前に送信します。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, DisplayName, Member, Notification, Password, RoomBinding,
    RoomId, RoomRepository,
};

use super::{broadcaster::EventBroadcaster, error::RequestError, leave_room::LeaveRoomUseCase};

/// 表示名が指定されなかった参加者の名前
pub const GUEST_NAME: &str = "Guest";

/// 参加が確定した結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    pub member: Member,
    /// 参加前から Room にいたメンバー（参加順）
    pub existing: Vec<Member>,
}

#[derive(Clone)]
pub struct JoinRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
    leave: LeaveRoomUseCase,
}

impl JoinRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        connections: Arc<dyn ConnectionRepository>,
        broadcaster: EventBroadcaster,
        leave: LeaveRoomUseCase,
    ) -> Self {
        Self {
            rooms,
            connections,
            broadcaster,
            leave,
        }
    }

    /// Room ID とパスワードを検証してから参加する
    ///
    /// 失敗した場合はメンバーシップもチャット履歴も変更されない。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: Option<String>,
        password: Password,
        name: Option<String>,
    ) -> Result<JoinOutcome, RequestError> {
        let room_id = room_id
            .and_then(|id| RoomId::new(id).ok())
            .ok_or(RequestError::MissingRoomId)?;

        if !self.rooms.verify_password(&room_id, &password).await? {
            tracing::info!(
                "Connection '{}' rejected from '{}': bad password",
                connection_id,
                room_id
            );
            return Err(RequestError::BadPassword);
        }

        self.admit(
            connection_id,
            room_id,
            DisplayName::parse_or(name, GUEST_NAME),
        )
        .await
    }

    /// 検証済みの Room にメンバーとして登録する
    ///
    /// 別の Room に参加中であれば、先にそちらから退出する。
    pub async fn admit(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        name: DisplayName,
    ) -> Result<JoinOutcome, RequestError> {
        if let Some(current) = self.connections.binding_of(connection_id).await
            && current.room_id != room_id
        {
            self.leave.execute(connection_id).await?;
        }

        let existing: Vec<Member> = self
            .rooms
            .get_members(&room_id)
            .await?
            .into_iter()
            .filter(|m| {
                m.connection() != Some(connection_id)
                    && m.screen_share_owner() != Some(connection_id)
            })
            .collect();

        let member = Member::real(connection_id, name.clone());
        self.rooms.upsert_member(&room_id, member.clone()).await?;
        self.connections
            .bind(
                connection_id,
                RoomBinding {
                    room_id: room_id.clone(),
                    name,
                },
            )
            .await?;

        tracing::info!(
            "'{}' ({}) joined room '{}'",
            member.name,
            connection_id,
            room_id
        );

        Ok(JoinOutcome {
            room_id,
            member,
            existing,
        })
    }

    /// 確定した参加を通知する
    ///
    /// 1. 参加者本人にチャット履歴
    /// 2. Room の全員（本人を含む）にメンバー一覧
    /// 3. 既存のメンバーに `user-connected`
    pub async fn announce(&self, connection_id: &ConnectionId, outcome: &JoinOutcome) {
        match self.rooms.get_chat_history(&outcome.room_id).await {
            Ok(history) => {
                self.broadcaster
                    .send_to(connection_id, &Notification::ChatHistory(history))
                    .await;
            }
            Err(e) => tracing::warn!("Failed to load chat history: {}", e),
        }

        self.broadcaster.member_list(&outcome.room_id).await;

        self.broadcaster
            .to_others(
                &outcome.room_id,
                connection_id,
                &Notification::UserConnected {
                    id: outcome.member.id.clone(),
                    name: outcome.member.name.clone(),
                },
            )
            .await;
    }
}
