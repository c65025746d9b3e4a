//! UseCase: Room からの退出
//!
//! 切断時と `leaveRoom` の両方から呼ばれます。
//!
//! 1. 画面共有メンバー、実メンバーの順に削除し、それぞれ残りのメンバーに `user-disconnected` を通知
//! 2. 最終的なメンバー一覧を 1 回だけ配信
//! 3. メンバーが 0 人になった Room は即座に破棄
//!
//! Room に参加していない接続に対しては何もしません（冪等）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, Notification, RepositoryError, RoomId, RoomRepository,
};

use super::{broadcaster::EventBroadcaster, error::RequestError};

#[derive(Clone)]
pub struct LeaveRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
}

impl LeaveRoomUseCase {
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

    /// 接続を現在の Room から退出させる
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RoomId))` - 退出した Room
    /// * `Ok(None)` - どの Room にも参加していなかった
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<RoomId>, RequestError> {
        // 未登録の接続も「未参加」として扱う
        let Some(binding) = self.connections.unbind(connection_id).await.unwrap_or_default() else {
            tracing::debug!("Connection '{}' is not in a room", connection_id);
            return Ok(None);
        };
        let room_id = binding.room_id;

        let removed = match self.rooms.remove_connection(&room_id, connection_id).await {
            Ok(removed) => removed,
            Err(RepositoryError::RoomNotFound(_)) => {
                tracing::debug!("Room '{}' is already gone", room_id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let remaining = self.rooms.get_members(&room_id).await?;
        let recipients: Vec<ConnectionId> = remaining
            .iter()
            .filter_map(|m| m.connection())
            .cloned()
            .collect();

        // 画面共有メンバー → 実メンバーの順
        for member in &removed {
            self.broadcaster
                .send_to_all(
                    recipients.clone(),
                    &Notification::UserDisconnected(member.id.clone()),
                )
                .await;
        }
        self.broadcaster
            .send_to_all(recipients, &Notification::MemberList(remaining.clone()))
            .await;

        tracing::info!(
            "'{}' ({}) left room '{}'",
            binding.name,
            connection_id,
            room_id
        );

        if remaining.is_empty() {
            self.rooms.delete_room(&room_id).await?;
            tracing::info!("Room '{}' removed (empty)", room_id);
        }

        Ok(Some(room_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dto::websocket::ServerMessage;
    use crate::usecase::test_support::{Fixture, events};

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        // テスト項目: 退出すると残りのメンバーに user-disconnected と memberList が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.create_room("ABC123", "").await;
        let (_alice, mut alice_rx) = fixture.join(&room_id, "alice", "Alice").await;
        let (bob, mut bob_rx) = fixture.join(&room_id, "bob", "Bob").await;
        events(&mut alice_rx);

        // when (操作):
        let result = fixture.usecases().leave.execute(&bob).await;

        // then (期待する結果):
        assert_eq!(result, Ok(Some(room_id.clone())));
        let received = events(&mut alice_rx);
        assert_eq!(received.len(), 2);
        assert_eq!(
            received[0],
            ServerMessage::UserDisconnected("bob".to_string())
        );
        match &received[1] {
            ServerMessage::MemberList(members) => {
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].id, "alice");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events(&mut bob_rx).is_empty());
        assert_eq!(fixture.connections.binding_of(&bob).await, None);
    }

    #[tokio::test]
    async fn test_leave_with_screen_share_emits_two_disconnects() {
        // テスト項目: 画面共有中の退出では仮想メンバー → 実メンバーの順に 2 回通知される
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.create_room("ABC123", "").await;
        let (alice, _alice_rx) = fixture.join(&room_id, "alice", "Alice").await;
        let (_bob, mut bob_rx) = fixture.join(&room_id, "bob", "Bob").await;
        fixture
            .usecases()
            .screen_share
            .start(&alice, None)
            .await
            .unwrap();
        events(&mut bob_rx);

        // when (操作):
        fixture.usecases().leave.execute(&alice).await.unwrap();

        // then (期待する結果):
        let received = events(&mut bob_rx);
        assert_eq!(
            received[..2],
            [
                ServerMessage::UserDisconnected("alice_screen".to_string()),
                ServerMessage::UserDisconnected("alice".to_string()),
            ]
        );
        assert!(matches!(&received[2], ServerMessage::MemberList(m) if m.len() == 1));
        assert_eq!(received.len(), 3);
    }

    #[tokio::test]
    async fn test_last_member_leaving_destroys_room() {
        // テスト項目: 最後のメンバーが退出すると Room は破棄され、同じ ID で再作成できる
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.create_room("ABC123", "").await;
        let (alice, _alice_rx) = fixture.join(&room_id, "alice", "Alice").await;

        // when (操作):
        fixture.usecases().leave.execute(&alice).await.unwrap();

        // then (期待する結果):
        assert_eq!(fixture.rooms.count_rooms().await, 0);
        let recreated = fixture
            .usecases()
            .create_room
            .execute(Some("ABC123".to_string()), Default::default())
            .await;
        assert!(recreated.is_ok());
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: Room に参加していない接続の退出は何もしない（冪等性）
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.create_room("ABC123", "").await;
        let (alice, _alice_rx) = fixture.join(&room_id, "alice", "Alice").await;
        let usecase = fixture.usecases().leave;
        usecase.execute(&alice).await.unwrap();

        // when (操作):
        let second = usecase.execute(&alice).await;
        let unknown = usecase
            .execute(&ConnectionId::new("ghost".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(second, Ok(None));
        assert_eq!(unknown, Ok(None));
    }
}
