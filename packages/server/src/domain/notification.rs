//! 参加者へ配信する通知（ドメインイベント）
//!
//! UseCase 層は配信内容をこの型で表現し、ワイヤ形式への変換は
//! Infrastructure 層の `MessagePusher` 実装が担当します。

use super::{
    entity::{ChatMessage, Member},
    value_object::{
        ConnectionId, DisplayName, Emoji, MemberId, MemberStatus, RoomId, SignalPayload,
    },
};

/// Why a create/join request was refused, as reported in its acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Stable error code (e.g. `BadPassword`)
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// 接続直後に本人へ通知する接続 ID
    Connected(ConnectionId),
    /// createRoom の応答
    RoomCreated(Result<RoomId, Rejection>),
    /// joinRoom の応答
    RoomJoined(Result<(), Rejection>),
    /// 参加前から Room にいたメンバー（新規参加者のみに送信）
    ExistingUsers(Vec<Member>),
    ChatHistory(Vec<ChatMessage>),
    MemberList(Vec<Member>),
    UserConnected {
        id: MemberId,
        name: DisplayName,
    },
    UserDisconnected(MemberId),
    Signal {
        from: MemberId,
        signal: SignalPayload,
        name: DisplayName,
    },
    /// 仮想画面共有メンバー宛ての応答を所有者へ転送したもの
    ScreenSignalReply {
        from: MemberId,
        signal: SignalPayload,
    },
    PeerStatusUpdate {
        id: MemberId,
        status: MemberStatus,
    },
    PeerAudioUpdate {
        id: MemberId,
        audio_on: bool,
    },
    ChatMessage(ChatMessage),
    Reaction {
        emoji: Emoji,
        from: ConnectionId,
        name: DisplayName,
    },
    /// 画面共有の開始者本人に仮想メンバー ID を通知する
    SharingStarted {
        screen_share_id: MemberId,
    },
}

impl Notification {
    /// ログ出力用のイベント名
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::RoomCreated(_) => "createRoom-ack",
            Self::RoomJoined(_) => "joinRoom-ack",
            Self::ExistingUsers(_) => "existing-users",
            Self::ChatHistory(_) => "chatHistory",
            Self::MemberList(_) => "memberList",
            Self::UserConnected { .. } => "user-connected",
            Self::UserDisconnected(_) => "user-disconnected",
            Self::Signal { .. } => "signal",
            Self::ScreenSignalReply { .. } => "signal-screen-reply",
            Self::PeerStatusUpdate { .. } => "peer-status-update",
            Self::PeerAudioUpdate { .. } => "peer-audio-update",
            Self::ChatMessage(_) => "chatMessage",
            Self::Reaction { .. } => "receiveReaction",
            Self::SharingStarted { .. } => "sharing-started-you",
        }
    }
}
