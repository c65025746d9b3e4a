//! InMemory Connection Repository 実装
//!
//! 接続中のクライアントと Room への紐付けを HashMap で管理します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Connection, ConnectionId, ConnectionRepository, RepositoryError, RoomBinding};

/// インメモリ Connection Repository 実装
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    /// Connection ID → Connection
    connections: Arc<Mutex<HashMap<ConnectionId, Connection>>>,
}

impl InMemoryConnectionRepository {
    pub fn new(connections: Arc<Mutex<HashMap<ConnectionId, Connection>>>) -> Self {
        Self { connections }
    }
}

fn not_found(connection_id: &ConnectionId) -> RepositoryError {
    RepositoryError::ConnectionNotFound(connection_id.as_str().to_string())
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn register(&self, connection: Connection) -> Result<(), RepositoryError> {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&connection.id) {
            return Err(RepositoryError::DuplicateConnection(
                connection.id.as_str().to_string(),
            ));
        }
        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id)
    }

    async fn find(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let connections = self.connections.lock().await;
        connections.get(connection_id).cloned()
    }

    async fn bind(
        &self,
        connection_id: &ConnectionId,
        binding: RoomBinding,
    ) -> Result<(), RepositoryError> {
        let mut connections = self.connections.lock().await;
        let connection = connections
            .get_mut(connection_id)
            .ok_or_else(|| not_found(connection_id))?;
        connection.binding = Some(binding);
        Ok(())
    }

    async fn unbind(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<RoomBinding>, RepositoryError> {
        let mut connections = self.connections.lock().await;
        let connection = connections
            .get_mut(connection_id)
            .ok_or_else(|| not_found(connection_id))?;
        Ok(connection.binding.take())
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, RoomId, Timestamp};

    fn create_test_connection(id: &str) -> Connection {
        Connection::new(
            ConnectionId::new(id.to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn create_test_binding() -> RoomBinding {
        RoomBinding {
            room_id: RoomId::new("ABC123".to_string()).unwrap(),
            name: DisplayName::new("Alice".to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_register_and_find() {
        // テスト項目: 登録した接続は紐付けなしの状態で取得できる
        // given (前提条件):
        let repo = InMemoryConnectionRepository::default();
        let connection = create_test_connection("alice");

        // when (操作):
        repo.register(connection.clone()).await.unwrap();

        // then (期待する結果):
        assert_eq!(repo.find(&connection.id).await, Some(connection.clone()));
        assert_eq!(repo.binding_of(&connection.id).await, None);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_connection() {
        // テスト項目: 同じ接続 ID の二重登録はエラーになる
        // given (前提条件):
        let repo = InMemoryConnectionRepository::default();
        repo.register(create_test_connection("alice")).await.unwrap();

        // when (操作):
        let result = repo.register(create_test_connection("alice")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::DuplicateConnection("alice".to_string()))
        );
    }

    #[tokio::test]
    async fn test_bind_and_unbind() {
        // テスト項目: 接続を Room に紐付け、解除すると解除前の紐付けが返される
        // given (前提条件):
        let repo = InMemoryConnectionRepository::default();
        let connection = create_test_connection("alice");
        repo.register(connection.clone()).await.unwrap();

        // when (操作):
        repo.bind(&connection.id, create_test_binding())
            .await
            .unwrap();
        let bound = repo.binding_of(&connection.id).await;
        let released = repo.unbind(&connection.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(bound, Some(create_test_binding()));
        assert_eq!(released, Some(create_test_binding()));
        assert_eq!(repo.binding_of(&connection.id).await, None);
    }

    #[tokio::test]
    async fn test_bind_unknown_connection() {
        // テスト項目: 未登録の接続への紐付けは ConnectionNotFound エラーになる
        // given (前提条件):
        let repo = InMemoryConnectionRepository::default();
        let unknown = ConnectionId::new("ghost".to_string()).unwrap();

        // when (操作):
        let result = repo.bind(&unknown, create_test_binding()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::ConnectionNotFound("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 接続の削除は何度実行しても問題なく処理される（冪等性）
        // given (前提条件):
        let repo = InMemoryConnectionRepository::default();
        let connection = create_test_connection("alice");
        repo.register(connection.clone()).await.unwrap();

        // when (操作):
        let first = repo.unregister(&connection.id).await;
        let second = repo.unregister(&connection.id).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(repo.count().await, 0);
    }
}
