//! UseCase: Room 一覧・詳細の取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::RequestError;

/// Room 一覧取得のユースケース
#[derive(Clone)]
pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// アクティブな Room を作成日時順に返す
    pub async fn execute(&self) -> Vec<Room> {
        self.rooms.list_rooms().await
    }
}

/// Room 詳細取得のユースケース
#[derive(Clone)]
pub struct GetRoomDetailUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn execute(&self, room_id: String) -> Result<Room, RequestError> {
        let room_id = RoomId::new(room_id).map_err(|_| RequestError::MissingRoomId)?;
        Ok(self.rooms.get_room(&room_id).await?)
    }
}
