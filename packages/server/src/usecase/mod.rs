//! UseCase layer: one use case per relay operation.
//!
//! Use cases depend only on the domain traits (`RoomRepository`, `ConnectionRepository`,
//! `MessagePusher`). Callers must invoke them one event at a time; see `ui::dispatcher`.

pub mod broadcaster;
pub mod connect_participant;
pub mod create_room;
pub mod disconnect_participant;
pub mod error;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod relay_signal;
pub mod screen_share;
pub mod send_message;
pub mod send_reaction;
pub mod update_presence;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{ConnectionRepository, MessagePusher, RoomRepository};

pub use broadcaster::EventBroadcaster;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, RequestError};
pub use get_rooms::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use join_room::{GUEST_NAME, JoinOutcome, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use relay_signal::{RelaySignalUseCase, SignalRoute};
pub use screen_share::{SCREEN_SHARE_NAME, ScreenShareUseCase};
pub use send_message::SendMessageUseCase;
pub use send_reaction::SendReactionUseCase;
pub use update_presence::UpdatePresenceUseCase;

/// 全ユースケースをまとめたもの（依存関係の組み立てを 1 か所にする）
#[derive(Clone)]
pub struct RelayUseCases {
    pub connect: ConnectParticipantUseCase,
    pub disconnect: DisconnectParticipantUseCase,
    pub create_room: CreateRoomUseCase,
    pub join_room: JoinRoomUseCase,
    pub leave: LeaveRoomUseCase,
    pub relay_signal: RelaySignalUseCase,
    pub update_presence: UpdatePresenceUseCase,
    pub screen_share: ScreenShareUseCase,
    pub send_message: SendMessageUseCase,
    pub send_reaction: SendReactionUseCase,
    pub get_rooms: GetRoomsUseCase,
    pub get_room_detail: GetRoomDetailUseCase,
}

impl RelayUseCases {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let broadcaster = EventBroadcaster::new(rooms.clone(), message_pusher.clone());
        let leave = LeaveRoomUseCase::new(rooms.clone(), connections.clone(), broadcaster.clone());

        Self {
            connect: ConnectParticipantUseCase::new(
                connections.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            disconnect: DisconnectParticipantUseCase::new(
                connections.clone(),
                message_pusher,
                leave.clone(),
            ),
            create_room: CreateRoomUseCase::new(rooms.clone(), clock.clone()),
            join_room: JoinRoomUseCase::new(
                rooms.clone(),
                connections.clone(),
                broadcaster.clone(),
                leave.clone(),
            ),
            leave,
            relay_signal: RelaySignalUseCase::new(
                rooms.clone(),
                connections.clone(),
                broadcaster.clone(),
            ),
            update_presence: UpdatePresenceUseCase::new(
                rooms.clone(),
                connections.clone(),
                broadcaster.clone(),
            ),
            screen_share: ScreenShareUseCase::new(
                rooms.clone(),
                connections.clone(),
                broadcaster.clone(),
            ),
            send_message: SendMessageUseCase::new(
                rooms.clone(),
                connections.clone(),
                broadcaster.clone(),
                clock,
            ),
            send_reaction: SendReactionUseCase::new(connections, broadcaster),
            get_rooms: GetRoomsUseCase::new(rooms.clone()),
            get_room_detail: GetRoomDetailUseCase::new(rooms),
        }
    }
}
