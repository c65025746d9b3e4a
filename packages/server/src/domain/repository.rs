//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::HashSet;

use async_trait::async_trait;

use super::{
    ChatMessage, Connection, ConnectionId, Member, MemberId, Password, RepositoryError, Room,
    RoomBinding, RoomId,
};

/// Room Repository trait
///
/// アクティブな Room の集合（Room Store）へのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を追加（同じ ID の Room が存在する場合は `DuplicateRoom`）
    async fn insert_room(&self, room: Room) -> Result<(), RepositoryError>;

    /// Room を削除
    async fn delete_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// Room エンティティを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 全ての Room を取得
    async fn list_rooms(&self) -> Vec<Room>;

    /// アクティブな Room ID の集合を取得
    async fn active_room_ids(&self) -> HashSet<RoomId>;

    /// パスワードを検証
    async fn verify_password(
        &self,
        room_id: &RoomId,
        password: &Password,
    ) -> Result<bool, RepositoryError>;

    /// メンバーを追加（同じ ID のメンバーは置き換え、置き換え前のメンバーを返す）
    async fn upsert_member(
        &self,
        room_id: &RoomId,
        member: Member,
    ) -> Result<Option<Member>, RepositoryError>;

    /// メンバーを削除（実メンバーの場合は画面共有メンバーも削除される）
    async fn remove_member(
        &self,
        room_id: &RoomId,
        member_id: &MemberId,
    ) -> Result<Vec<Member>, RepositoryError>;

    /// 接続が所有するメンバー（画面共有 → 実メンバーの順）を削除
    async fn remove_connection(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<Vec<Member>, RepositoryError>;

    /// メンバーを取得
    async fn find_member(
        &self,
        room_id: &RoomId,
        member_id: &MemberId,
    ) -> Result<Option<Member>, RepositoryError>;

    /// 接続の画面共有メンバーを取得
    async fn find_screen_share(
        &self,
        room_id: &RoomId,
        owner: &ConnectionId,
    ) -> Result<Option<Member>, RepositoryError>;

    /// Room のメンバー一覧を取得（参加順）
    async fn get_members(&self, room_id: &RoomId) -> Result<Vec<Member>, RepositoryError>;

    /// メッセージを Room のチャット履歴に追加
    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RepositoryError>;

    /// チャット履歴を取得
    async fn get_chat_history(&self, room_id: &RoomId)
    -> Result<Vec<ChatMessage>, RepositoryError>;

    /// アクティブな Room 数を取得
    async fn count_rooms(&self) -> usize;
}

/// Connection Repository trait
///
/// 接続中のクライアントと、その接続が参加している Room の紐付けを管理する。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// 接続を登録
    async fn register(&self, connection: Connection) -> Result<(), RepositoryError>;

    /// 接続を削除
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続を取得
    async fn find(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続を Room と表示名に紐付け
    async fn bind(
        &self,
        connection_id: &ConnectionId,
        binding: RoomBinding,
    ) -> Result<(), RepositoryError>;

    /// 紐付けを解除し、解除前の紐付けを返す
    async fn unbind(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<RoomBinding>, RepositoryError>;

    /// 接続中のクライアント数を取得
    async fn count(&self) -> usize;

    /// 接続が参加している Room の紐付けを取得
    async fn binding_of(&self, connection_id: &ConnectionId) -> Option<RoomBinding> {
        self.find(connection_id)
            .await
            .and_then(|connection| connection.binding)
    }
}
