//! ユースケースのテスト用フィクスチャ
//!
//! 実際のインメモリ Repository と WebSocketMessagePusher を使い、
//! 各クライアントの送信チャンネルに届いたフレームを検証します。

use std::{collections::HashMap, sync::Arc};

use huddle_shared::time::FixedClock;
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{ConnectionId, DisplayName, MessagePusher, Password, RoomId},
    infrastructure::{
        dto::websocket::ServerMessage,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRepository, InMemoryRoomRepository},
    },
};

use super::{EventBroadcaster, RelayUseCases};

pub struct Fixture {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub connections: Arc<InMemoryConnectionRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
}

impl Fixture {
    /// FixedClock が返す時刻
    pub const NOW: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self {
            rooms: Arc::new(InMemoryRoomRepository::default()),
            connections: Arc::new(InMemoryConnectionRepository::default()),
            pusher: Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
                HashMap::new(),
            )))),
        }
    }

    pub fn usecases(&self) -> RelayUseCases {
        RelayUseCases::new(
            self.rooms.clone(),
            self.connections.clone(),
            self.pusher.clone(),
            Arc::new(FixedClock::new(Self::NOW)),
        )
    }

    pub fn broadcaster(&self) -> EventBroadcaster {
        EventBroadcaster::new(self.rooms.clone(), self.pusher.clone())
    }

    /// 接続を登録し、`connected` 通知を読み捨てた受信チャンネルを返す
    pub async fn connect(&self, id: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionId::new(id.to_string()).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.usecases()
            .connect
            .execute(connection_id.clone(), tx)
            .await
            .unwrap();
        events(&mut rx);
        (connection_id, rx)
    }

    /// 既存の接続に新しい受信チャンネルを割り当てる
    pub async fn reattach(&self, id: &ConnectionId) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(id.clone(), tx).await;
        rx
    }

    pub async fn create_room(&self, id: &str, password: &str) -> RoomId {
        self.usecases()
            .create_room
            .execute(Some(id.to_string()), Password::new(password.to_string()))
            .await
            .unwrap()
    }

    /// 接続して Room に参加する（参加者本人宛ての通知は読み捨てる）
    pub async fn join(
        &self,
        room_id: &RoomId,
        id: &str,
        name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (connection_id, mut rx) = self.connect(id).await;
        let join = self.usecases().join_room;
        let outcome = join
            .admit(
                &connection_id,
                room_id.clone(),
                DisplayName::new(name.to_string()).unwrap(),
            )
            .await
            .unwrap();
        join.announce(&connection_id, &outcome).await;
        events(&mut rx);
        (connection_id, rx)
    }
}

/// チャンネルに溜まっているフレームをすべて取り出してデコードする
pub fn events(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerMessage> {
    let mut received = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        received.push(serde_json::from_str(&frame).unwrap());
    }
    received
}
