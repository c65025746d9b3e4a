//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - サニタイズ、チャット履歴への追加、Room 全員（送信者を含む）へのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - マークアップ文字がエスケープされて配信されることを保証
//! - 履歴が 500 件を超えないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - エッジケース：空白のみのメッセージ、Room 未参加の送信者

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatText, ConnectionId, ConnectionRepository, Notification, RoomRepository,
    Timestamp,
};

use super::{broadcaster::EventBroadcaster, error::RequestError};

/// メッセージ送信のユースケース
#[derive(Clone)]
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        connections: Arc<dyn ConnectionRepository>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            connections,
            broadcaster,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ChatMessage))` - 履歴に追加され配信されたメッセージ
    /// * `Ok(None)` - Room 未参加、または空のメッセージのため破棄
    pub async fn execute(
        &self,
        from: &ConnectionId,
        text: &str,
    ) -> Result<Option<ChatMessage>, RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring chat from '{}': not in a room", from);
            return Ok(None);
        };
        let Some(text) = ChatText::sanitize(text) else {
            tracing::debug!("Ignoring empty chat from '{}'", from);
            return Ok(None);
        };

        let message = ChatMessage::new(
            from.clone(),
            &binding.name,
            text,
            Timestamp::new(self.clock.now_millis()),
        );

        // 1. 履歴に追加（上限を超えた分は古い順に破棄）
        self.rooms
            .append_message(&binding.room_id, message.clone())
            .await?;

        // 2. 送信者を含む Room 全員にブロードキャスト
        self.broadcaster
            .to_room(&binding.room_id, &Notification::ChatMessage(message.clone()))
            .await;

        tracing::debug!("Chat from '{}' in room '{}'", from, binding.room_id);
        Ok(Some(message))
    }
}
