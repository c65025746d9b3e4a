//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - Room からの退出と、接続レジストリ・MessagePusher からの登録解除
//!
//! ### なぜこのテストが必要か
//! - 切断時に残りのメンバーへ通知されることを保証
//! - 切断は何度実行しても安全であること（冪等性）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：Room 参加中の切断
//! - エッジケース：Room 未参加の切断、二重の切断

use std::sync::Arc;

use huddle_shared::time::timestamp_to_rfc3339;

use crate::domain::{ConnectionId, ConnectionRepository, MessagePusher, RoomId};

use super::{error::RequestError, leave_room::LeaveRoomUseCase};

/// 参加者切断のユースケース
#[derive(Clone)]
pub struct DisconnectParticipantUseCase {
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    leave: LeaveRoomUseCase,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        leave: LeaveRoomUseCase,
    ) -> Self {
        Self {
            connections,
            message_pusher,
            leave,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断した接続の ID
    /// * `reason` - トランスポート層から通知された切断理由（ログ用）
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RoomId))` - 退出した Room
    /// * `Ok(None)` - Room に参加していなかった
    /// * `Err(RequestError)` - 退出処理の失敗（登録解除は常に行われる）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        reason: &str,
    ) -> Result<Option<RoomId>, RequestError> {
        // 1. Room から退出（残りのメンバーへの通知を含む）
        let left = self.leave.execute(connection_id).await;

        // 2. 登録解除
        let connection = self.connections.unregister(connection_id).await;
        self.message_pusher.unregister_client(connection_id).await;

        match connection {
            Some(connection) => tracing::info!(
                "Connection '{}' closed ({}), connected since {}",
                connection_id,
                reason,
                timestamp_to_rfc3339(connection.connected_at.value())
            ),
            None => tracing::info!("Connection '{}' closed ({})", connection_id, reason),
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberId, RoomRepository};
    use crate::infrastructure::dto::websocket::ServerMessage;
    use crate::usecase::test_support::{Fixture, events};

    #[tokio::test]
    async fn test_disconnect_participant_success() {
        // テスト項目: 切断すると Room から削除され、残りのメンバーに通知される
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.create_room("ABC123", "").await;
        let (_alice, mut alice_rx) = fixture.join(&room_id, "alice", "Alice").await;
        let (bob, _bob_rx) = fixture.join(&room_id, "bob", "Bob").await;
        events(&mut alice_rx);

        // when (操作):
        let result = fixture
            .usecases()
            .disconnect
            .execute(&bob, "client closed")
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(Some(room_id.clone())));
        assert_eq!(fixture.connections.count().await, 1);
        assert_eq!(
            fixture
                .rooms
                .find_member(&room_id, &MemberId::from(&bob))
                .await
                .unwrap(),
            None
        );
        let received = events(&mut alice_rx);
        assert_eq!(
            received[0],
            ServerMessage::UserDisconnected("bob".to_string())
        );
        assert!(matches!(&received[1], ServerMessage::MemberList(m) if m.len() == 1));
    }

    #[tokio::test]
    async fn test_disconnect_without_room_is_idempotent() {
        // テスト項目: Room 未参加の接続の切断、二重の切断はエラーにならない
        // given (前提条件):
        let fixture = Fixture::new();
        let (alice, _alice_rx) = fixture.connect("alice").await;
        let usecase = fixture.usecases().disconnect;

        // when (操作):
        let first = usecase.execute(&alice, "client closed").await;
        let second = usecase.execute(&alice, "client closed").await;

        // then (期待する結果):
        assert_eq!(first, Ok(None));
        assert_eq!(second, Ok(None));
        assert_eq!(fixture.connections.count().await, 0);
    }
}
