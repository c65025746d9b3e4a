//! Domain layer: entities, value objects and the interfaces the relay depends on.

pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod notification;
pub mod repository;
pub mod value_object;

pub use entity::{
    CHAT_HISTORY_LIMIT, ChatMessage, Connection, Member, MemberKind, Presence, Room, RoomBinding,
};
pub use error::{MessagePushError, RepositoryError, RoomError, ValueObjectError};
pub use factory::RoomIdFactory;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notification::{Notification, Rejection};
pub use repository::{ConnectionRepository, RoomRepository};
pub use value_object::{
    ChatText, ConnectionId, DisplayName, Emoji, MemberId, MemberStatus, Password, RoomId,
    SignalKind, SignalPayload, Timestamp,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockRoomRepository;
