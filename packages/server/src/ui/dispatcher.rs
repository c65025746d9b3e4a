//! Event dispatcher: the single task that mutates room state.
//!
//! Every WebSocket connection forwards its events into one channel. The dispatcher
//! handles each event to completion, including every resulting push, before it
//! receives the next one, so broadcasts for a room are never interleaved.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{
        ConnectionId, DisplayName, MessagePusher, Notification, Password, PusherChannel,
        SignalPayload,
    },
    infrastructure::dto::websocket::{ClientMessage, CreateRoomRequest, JoinRoomRequest},
    usecase::{RelayUseCases, RequestError},
};

/// ディスパッチャが処理するイベント
#[derive(Debug)]
pub enum RelayCommand {
    /// トランスポート層で新しい接続が確立した
    Connected {
        connection_id: ConnectionId,
        channel: PusherChannel,
    },
    /// クライアントから受信したイベント
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },
    /// `event` は読めたが `data` を解析できなかったフレーム
    Malformed {
        from: ConnectionId,
        event: String,
    },
    /// 接続が切断された
    Disconnected {
        connection_id: ConnectionId,
        reason: String,
    },
}

impl RelayCommand {
    fn connection_id(&self) -> &ConnectionId {
        match self {
            Self::Connected { connection_id, .. } => connection_id,
            Self::Message { from, .. } | Self::Malformed { from, .. } => from,
            Self::Disconnected { connection_id, .. } => connection_id,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connect",
            Self::Message { message, .. } => message.event_name(),
            Self::Malformed { .. } => "malformed frame",
            Self::Disconnected { .. } => "disconnect",
        }
    }

    /// 処理中に panic した場合に返す応答（ack を返すイベントのみ）
    fn fault_ack(&self) -> Option<Notification> {
        let Self::Message { message, .. } = self else {
            return None;
        };
        let rejection = || RequestError::ServerFault(String::new()).rejection();
        match message {
            ClientMessage::CreateRoom(_) => Some(Notification::RoomCreated(Err(rejection()))),
            ClientMessage::JoinRoom(_) => Some(Notification::RoomJoined(Err(rejection()))),
            _ => None,
        }
    }
}

/// ディスパッチャへイベントを送るためのハンドル
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::UnboundedSender<RelayCommand>,
}

impl DispatcherHandle {
    /// イベントをキューに積む
    ///
    /// ディスパッチャが停止している場合は `false` を返す。
    pub fn dispatch(&self, command: RelayCommand) -> bool {
        match self.sender.send(command) {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                tracing::error!(
                    "Event dispatcher is not running, dropped '{}' from '{}'",
                    command.event_name(),
                    command.connection_id()
                );
                false
            }
        }
    }
}

pub struct EventDispatcher {
    usecases: RelayUseCases,
    /// ack の返信用
    message_pusher: Arc<dyn MessagePusher>,
}

impl EventDispatcher {
    pub fn new(usecases: RelayUseCases, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            usecases,
            message_pusher,
        }
    }

    /// ディスパッチャのタスクを起動する
    pub fn spawn(self) -> (DispatcherHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(receiver));
        (DispatcherHandle { sender }, task)
    }

    /// 全てのハンドルが破棄されるまでイベントを 1 件ずつ処理する
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<RelayCommand>) {
        tracing::info!("Event dispatcher started");
        while let Some(command) = receiver.recv().await {
            self.handle(command).await;
        }
        tracing::info!("Event dispatcher stopped");
    }

    /// 1 件のイベントを処理する
    ///
    /// 処理中の panic はこのイベントの失敗として扱い、プロセスは停止しない。
    pub async fn handle(&self, command: RelayCommand) {
        let connection_id = command.connection_id().clone();
        let event = command.event_name();
        let fault_ack = command.fault_ack();

        let outcome = AssertUnwindSafe(self.process(command)).catch_unwind().await;
        if let Err(panic) = outcome {
            tracing::error!(
                "Handling '{}' from '{}' panicked: {}",
                event,
                connection_id,
                panic_message(panic.as_ref())
            );
            if let Some(ack) = fault_ack {
                self.reply(&connection_id, &ack).await;
            }
        }
    }

    async fn process(&self, command: RelayCommand) {
        match command {
            RelayCommand::Connected {
                connection_id,
                channel,
            } => {
                if let Err(e) = self
                    .usecases
                    .connect
                    .execute(connection_id.clone(), channel)
                    .await
                {
                    tracing::error!("Failed to register connection '{}': {}", connection_id, e);
                }
            }
            RelayCommand::Message { from, message } => self.on_message(&from, message).await,
            RelayCommand::Malformed { from, event } => self.reject_malformed(&from, &event).await,
            RelayCommand::Disconnected {
                connection_id,
                reason,
            } => {
                if let Err(e) = self
                    .usecases
                    .disconnect
                    .execute(&connection_id, &reason)
                    .await
                {
                    tracing::error!("Cleanup for '{}' failed: {}", connection_id, e);
                }
            }
        }
    }

    async fn on_message(&self, from: &ConnectionId, message: ClientMessage) {
        let event = message.event_name();
        tracing::debug!("Handling '{}' from '{}'", event, from);

        let usecases = &self.usecases;
        let result = match message {
            ClientMessage::CreateRoom(request) => {
                self.create_room(from, request).await;
                Ok(())
            }
            ClientMessage::JoinRoom(request) => {
                self.join_room(from, request).await;
                Ok(())
            }
            ClientMessage::LeaveRoom => usecases.leave.execute(from).await.map(drop),
            ClientMessage::Signal(request) => usecases
                .relay_signal
                .execute(from, request.to, SignalPayload::new(request.signal))
                .await
                .map(drop),
            ClientMessage::SignalScreen(request) => usecases
                .relay_signal
                .execute_as_screen(from, request.to, SignalPayload::new(request.signal))
                .await
                .map(drop),
            ClientMessage::UpdateStatus(request) => {
                usecases
                    .update_presence
                    .update_status(from, request.id, request.status, request.audio_on)
                    .await
            }
            ClientMessage::RaiseHand(request) => {
                usecases
                    .update_presence
                    .raise_hand(from, request.raised)
                    .await
            }
            ClientMessage::ChatMessage(text) => {
                usecases.send_message.execute(from, &text).await.map(drop)
            }
            ClientMessage::SendReaction(request) => {
                usecases.send_reaction.execute(from, &request.emoji).await
            }
            ClientMessage::StartSharing(request) => usecases
                .screen_share
                .start(from, request.name)
                .await
                .map(drop),
            ClientMessage::StopSharing => usecases.screen_share.stop(from).await.map(drop),
        };

        if let Err(e) = result {
            tracing::error!("'{}' from '{}' failed: {:?}", event, from, e);
        }
    }

    async fn create_room(&self, from: &ConnectionId, request: CreateRoomRequest) {
        let created = self
            .usecases
            .create_room
            .execute(request.room_id, Password::from(request.password))
            .await;
        if let Err(RequestError::ServerFault(detail)) = &created {
            tracing::error!("createRoom from '{}' failed: {}", from, detail);
        }

        let ack = created.as_ref().cloned().map_err(RequestError::rejection);
        self.reply(from, &Notification::RoomCreated(ack)).await;

        // autoJoin は名前が指定された場合のみ
        let Ok(room_id) = created else {
            return;
        };
        let Some(name) = request
            .name
            .filter(|_| request.auto_join)
            .and_then(|name| DisplayName::new(name).ok())
        else {
            return;
        };
        match self
            .usecases
            .join_room
            .admit(from, room_id.clone(), name)
            .await
        {
            Ok(outcome) => self.usecases.join_room.announce(from, &outcome).await,
            Err(e) => {
                tracing::error!("autoJoin for '{}' failed: {}", from, e);
                self.usecases.create_room.discard(&room_id).await;
            }
        }
    }

    async fn join_room(&self, from: &ConnectionId, request: JoinRoomRequest) {
        let joined = self
            .usecases
            .join_room
            .execute(
                from,
                request.room_id,
                Password::from(request.password),
                request.name,
            )
            .await;

        match joined {
            Ok(outcome) => {
                self.reply(from, &Notification::ExistingUsers(outcome.existing.clone()))
                    .await;
                self.reply(from, &Notification::RoomJoined(Ok(()))).await;
                self.usecases.join_room.announce(from, &outcome).await;
            }
            Err(e) => {
                if let RequestError::ServerFault(detail) = &e {
                    tracing::error!("joinRoom from '{}' failed: {}", from, detail);
                }
                self.reply(from, &Notification::RoomJoined(Err(e.rejection())))
                    .await;
            }
        }
    }

    /// ack を待つリクエストが解析できなかった場合も失敗応答を返す
    async fn reject_malformed(&self, from: &ConnectionId, event: &str) {
        let ack = match event {
            "createRoom" => Notification::RoomCreated(Err(
                RequestError::ServerFault(String::new()).rejection()
            )),
            "joinRoom" => Notification::RoomJoined(Err(RequestError::MissingRoomId.rejection())),
            _ => return,
        };
        self.reply(from, &ack).await;
    }

    async fn reply(&self, to: &ConnectionId, notification: &Notification) {
        if let Err(e) = self.message_pusher.push_to(to, notification).await {
            tracing::warn!(
                "Failed to send '{}' to '{}': {}",
                notification.event_name(),
                to,
                e
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    }
}
