//! Conversion logic between DTOs and domain entities.

use huddle_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, Member, MemberKind, Notification, Rejection, Room};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<&Member> for dto::MemberDto {
    fn from(model: &Member) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            name: model.name.as_str().to_string(),
            status: model.status(),
            audio_on: model.audio_on(),
            hand_raised: model.hand_raised(),
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.from.as_str().to_string(),
            name: model.sender_name.clone(),
            text: model.text.as_str().to_string(),
            time: model.timestamp.value(),
        }
    }
}

fn members(models: &[Member]) -> Vec<dto::MemberDto> {
    models.iter().map(dto::MemberDto::from).collect()
}

fn rejected(rejection: &Rejection) -> dto::AckDto {
    dto::AckDto {
        success: false,
        room_id: None,
        reason: Some(rejection.code.to_string()),
        message: Some(rejection.message.clone()),
    }
}

impl From<&Notification> for dto::ServerMessage {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::Connected(id) => Self::Connected(dto::ConnectedDto {
                id: id.as_str().to_string(),
            }),
            Notification::RoomCreated(Ok(room_id)) => Self::CreateRoomAck(dto::AckDto {
                success: true,
                room_id: Some(room_id.as_str().to_string()),
                reason: None,
                message: None,
            }),
            Notification::RoomCreated(Err(rejection)) => Self::CreateRoomAck(rejected(rejection)),
            Notification::RoomJoined(Ok(())) => Self::JoinRoomAck(dto::AckDto {
                success: true,
                room_id: None,
                reason: None,
                message: None,
            }),
            Notification::RoomJoined(Err(rejection)) => Self::JoinRoomAck(rejected(rejection)),
            Notification::ExistingUsers(list) => Self::ExistingUsers(members(list)),
            Notification::ChatHistory(history) => {
                Self::ChatHistory(history.iter().map(dto::ChatMessageDto::from).collect())
            }
            Notification::MemberList(list) => Self::MemberList(members(list)),
            Notification::UserConnected { id, name } => Self::UserConnected(dto::PeerDto {
                id: id.as_str().to_string(),
                name: name.as_str().to_string(),
            }),
            Notification::UserDisconnected(id) => Self::UserDisconnected(id.as_str().to_string()),
            Notification::Signal { from, signal, name } => Self::Signal(dto::SignalDto {
                from: from.as_str().to_string(),
                signal: signal.as_value().clone(),
                name: name.as_str().to_string(),
            }),
            Notification::ScreenSignalReply { from, signal } => {
                Self::SignalScreenReply(dto::ScreenReplyDto {
                    from: from.as_str().to_string(),
                    signal: signal.as_value().clone(),
                })
            }
            Notification::PeerStatusUpdate { id, status } => {
                Self::PeerStatusUpdate(dto::StatusUpdateDto {
                    id: id.as_str().to_string(),
                    status: *status,
                })
            }
            Notification::PeerAudioUpdate { id, audio_on } => {
                Self::PeerAudioUpdate(dto::AudioUpdateDto {
                    id: id.as_str().to_string(),
                    audio_on: *audio_on,
                })
            }
            Notification::ChatMessage(message) => Self::ChatMessage(message.into()),
            Notification::Reaction { emoji, from, name } => {
                Self::ReceiveReaction(dto::ReactionDto {
                    emoji: emoji.as_str().to_string(),
                    from_id: from.as_str().to_string(),
                    name: name.sanitized(),
                })
            }
            Notification::SharingStarted { screen_share_id } => {
                Self::SharingStartedYou(dto::SharingStartedDto {
                    screen_share_id: screen_share_id.as_str().to_string(),
                })
            }
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            members: room
                .members()
                .iter()
                .map(|m| m.name.as_str().to_string())
                .collect(),
            member_count: room.member_count(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Member> for http::MemberDetailDto {
    fn from(model: &Member) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            name: model.name.as_str().to_string(),
            status: model.status(),
            kind: match model.kind {
                MemberKind::Real { .. } => http::MemberKindDto::Real,
                MemberKind::ScreenShare { .. } => http::MemberKindDto::ScreenShare,
            },
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            members: room
                .members()
                .iter()
                .map(http::MemberDetailDto::from)
                .collect(),
            chat_count: room.chat_len(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}
