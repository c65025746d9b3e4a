//! UseCase: Room 作成
//!
//! Room ID が指定されなければ、アクティブな Room と衝突しない ID を採番します。

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{Password, Room, RoomId, RoomIdFactory, RoomRepository, Timestamp};

use super::error::RequestError;

/// Room 作成のユースケース
#[derive(Clone)]
pub struct CreateRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { rooms, clock }
    }

    /// 空の Room を作成する
    ///
    /// # Arguments
    ///
    /// * `requested` - 希望する Room ID（空白のみ・未指定なら自動採番）
    /// * `password` - Room パスワード（空文字列も有効）
    ///
    /// # Returns
    ///
    /// * `Ok(RoomId)` - 作成された Room の ID
    /// * `Err(RequestError::DuplicateRoom)` - 指定 ID の Room が既に存在する
    pub async fn execute(
        &self,
        requested: Option<String>,
        password: Password,
    ) -> Result<RoomId, RequestError> {
        let active = self.rooms.active_room_ids().await;
        let room_id = match requested.and_then(|id| RoomId::new(id).ok()) {
            Some(room_id) if active.contains(&room_id) => {
                return Err(RequestError::DuplicateRoom(room_id.into_string()));
            }
            Some(room_id) => room_id,
            None => RoomIdFactory::generate_unique(&active),
        };

        let room = Room::new(
            room_id.clone(),
            password,
            Timestamp::new(self.clock.now_millis()),
        );
        self.rooms.insert_room(room).await?;

        tracing::info!("Room '{}' created", room_id);
        Ok(room_id)
    }

    /// 作成直後の Room を取り消す（autoJoin の失敗時）
    pub async fn discard(&self, room_id: &RoomId) {
        match self.rooms.delete_room(room_id).await {
            Ok(_) => tracing::info!("Room '{}' discarded", room_id),
            Err(e) => tracing::warn!("Failed to discard room '{}': {}", room_id, e),
        }
    }
}
