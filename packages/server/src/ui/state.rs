//! Server state shared by the axum handlers.

use crate::usecase::{GetRoomDetailUseCase, GetRoomsUseCase};

use super::dispatcher::DispatcherHandle;

/// Shared application state
pub struct AppState {
    /// ルーム状態を変更するイベントはすべてディスパッチャ経由で処理する
    pub dispatcher: DispatcherHandle,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: GetRoomsUseCase,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: GetRoomDetailUseCase,
}
