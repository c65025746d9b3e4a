//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録と、接続直後の `connected` 通知
//!
//! ### なぜこのテストが必要か
//! - 接続 ID の重複を防ぐ
//! - クライアントが自分の接続 ID を最初に受け取れることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - 異常系：重複した接続 ID での接続試行

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, ConnectionRepository, MessagePusher, Notification, PusherChannel,
    RepositoryError, Timestamp,
};

use super::error::ConnectError;

/// 参加者接続のユースケース
#[derive(Clone)]
pub struct ConnectParticipantUseCase {
    /// 接続レジストリ
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connections,
            message_pusher,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - トランスポート層が採番した接続 ID
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 接続成功（Room には未参加）
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<Connection, ConnectError> {
        // 1. 接続レジストリに登録
        let connection = Connection::new(
            connection_id.clone(),
            Timestamp::new(self.clock.now_millis()),
        );
        self.connections
            .register(connection.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateConnection(id) => ConnectError::DuplicateConnection(id),
                other => ConnectError::Registry(other.to_string()),
            })?;

        // 2. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        // 3. 本人に接続 ID を通知
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &Notification::Connected(connection_id.clone()))
            .await
        {
            tracing::warn!("Failed to notify '{}' of its id: {}", connection_id, e);
        }

        tracing::info!("Connection '{}' established", connection_id);
        Ok(connection)
    }
}
