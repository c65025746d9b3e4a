//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! Room はプロセス内にのみ存在し、再起動をまたいで永続化されません。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, Member, MemberId, Password, RepositoryError, Room, RoomId,
    RoomRepository,
};

/// インメモリ Room Repository 実装
///
/// アクティブな Room を保持し、ドメイン層の RoomRepository trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemoryRoomRepository {
    /// Room ID → Room
    rooms: Arc<Mutex<HashMap<RoomId, Room>>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(rooms: Arc<Mutex<HashMap<RoomId, Room>>>) -> Self {
        Self { rooms }
    }
}

fn not_found(room_id: &RoomId) -> RepositoryError {
    RepositoryError::RoomNotFound(room_id.as_str().to_string())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert_room(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room.id) {
            return Err(RepositoryError::DuplicateRoom(room.id.as_str().to_string()));
        }
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        rooms.remove(room_id).ok_or_else(|| not_found(room_id))
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned().ok_or_else(|| not_found(room_id))
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Room> = rooms.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    async fn active_room_ids(&self) -> HashSet<RoomId> {
        let rooms = self.rooms.lock().await;
        rooms.keys().cloned().collect()
    }

    async fn verify_password(
        &self,
        room_id: &RoomId,
        password: &Password,
    ) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.verify_password(password))
    }

    async fn upsert_member(
        &self,
        room_id: &RoomId,
        member: Member,
    ) -> Result<Option<Member>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.upsert_member(member)?)
    }

    async fn remove_member(
        &self,
        room_id: &RoomId,
        member_id: &MemberId,
    ) -> Result<Vec<Member>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.remove_member(member_id))
    }

    async fn remove_connection(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<Vec<Member>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.remove_connection(connection_id))
    }

    async fn find_member(
        &self,
        room_id: &RoomId,
        member_id: &MemberId,
    ) -> Result<Option<Member>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.member(member_id).cloned())
    }

    async fn find_screen_share(
        &self,
        room_id: &RoomId,
        owner: &ConnectionId,
    ) -> Result<Option<Member>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.screen_share_of(owner).cloned())
    }

    async fn get_members(&self, room_id: &RoomId) -> Result<Vec<Member>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.members().to_vec())
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        room.push_message(message);
        Ok(())
    }

    async fn get_chat_history(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.chat_history())
    }

    async fn count_rooms(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatText, DisplayName, Timestamp};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository の Room の追加・削除とメンバー操作
    // - 重複した Room ID の拒否
    // - 存在しない Room への操作のエラー
    //
    // 【なぜこのテストが必要か】
    // - Repository は UseCase から呼ばれるデータアクセス層の中核
    // - Room の生成・破棄とメンバーシップの整合性を保証する必要がある
    // ========================================

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn conn(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    fn create_test_room(id: &str) -> Room {
        Room::new(room_id(id), Password::new("999999".to_string()), Timestamp::new(1000))
    }

    #[tokio::test]
    async fn test_insert_room_success() {
        // テスト項目: Room を追加するとアクティブな Room として取得できる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();

        // when (操作):
        let result = repo.insert_room(create_test_room("ABC123")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(repo.count_rooms().await, 1);
        assert!(repo.active_room_ids().await.contains(&room_id("ABC123")));
    }

    #[tokio::test]
    async fn test_insert_duplicate_room() {
        // テスト項目: 同じ ID の Room を追加すると DuplicateRoom エラーになる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        repo.insert_room(create_test_room("ABC123")).await.unwrap();

        // when (操作):
        let result = repo.insert_room(create_test_room("ABC123")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::DuplicateRoom("ABC123".to_string()))
        );
        assert_eq!(repo.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_deleted_room_id_can_be_reused() {
        // テスト項目: 削除された Room の ID は再利用できる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        repo.insert_room(create_test_room("ABC123")).await.unwrap();

        // when (操作):
        repo.delete_room(&room_id("ABC123")).await.unwrap();
        let result = repo.insert_room(create_test_room("ABC123")).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_member_operations_on_missing_room() {
        // テスト項目: 存在しない Room へのメンバー操作は RoomNotFound エラーになる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = conn("alice");

        // when (操作):
        let result = repo
            .upsert_member(&room_id("NOPE42"), Member::real(&alice, name("Alice")))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::RoomNotFound("NOPE42".to_string()))
        );
    }

    #[tokio::test]
    async fn test_remove_connection_returns_removed_members() {
        // テスト項目: 接続の削除で画面共有メンバーと実メンバーが順に返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let id = room_id("ABC123");
        let alice = conn("alice");
        repo.insert_room(create_test_room("ABC123")).await.unwrap();
        repo.upsert_member(&id, Member::real(&alice, name("Alice")))
            .await
            .unwrap();
        repo.upsert_member(&id, Member::screen_share(&alice, name("Screen")))
            .await
            .unwrap();

        // when (操作):
        let removed = repo.remove_connection(&id, &alice).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed.len(), 2);
        assert!(removed[0].is_screen_share());
        assert!(repo.get_members(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_screen_share_without_owner_is_rejected() {
        // テスト項目: 所有者のいない画面共有メンバーの追加はエラーになる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let id = room_id("ABC123");
        repo.insert_room(create_test_room("ABC123")).await.unwrap();

        // when (操作):
        let result = repo
            .upsert_member(&id, Member::screen_share(&conn("ghost"), name("Screen")))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Room(_))));
    }

    #[tokio::test]
    async fn test_append_message_success() {
        // テスト項目: メッセージを Room のチャット履歴に追加できる
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let id = room_id("ABC123");
        let alice = conn("alice");
        repo.insert_room(create_test_room("ABC123")).await.unwrap();

        // when (操作):
        let message = ChatMessage::new(
            alice.clone(),
            &name("Alice"),
            ChatText::sanitize("Hello").unwrap(),
            Timestamp::new(2000),
        );
        let result = repo.append_message(&id, message).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let history = repo.get_chat_history(&id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from, alice);
    }

    #[tokio::test]
    async fn test_verify_password() {
        // テスト項目: パスワード検証が Room に保存されたパスワードと比較される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let id = room_id("ABC123");
        repo.insert_room(create_test_room("ABC123")).await.unwrap();

        // when (操作):
        let ok = repo
            .verify_password(&id, &Password::new("999999".to_string()))
            .await
            .unwrap();
        let ng = repo
            .verify_password(&id, &Password::new("wrong".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(ok);
        assert!(!ng);
    }
}
