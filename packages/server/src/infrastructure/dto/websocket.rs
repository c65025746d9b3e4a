//! WebSocket event frames.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.
//! Field names inside payloads are camelCase.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, DeserializeOwned},
};
use serde_json::Value;
use thiserror::Error;

use crate::domain::MemberStatus;

// ========================================
// Client → Server
// ========================================

/// Events sent by a browser client.
///
/// `data` may be omitted or `null` for requests whose fields are all optional.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    CreateRoom(CreateRoomRequest),
    JoinRoom(JoinRoomRequest),
    LeaveRoom,
    Signal(SignalRequest),
    SignalScreen(ScreenSignalRequest),
    UpdateStatus(UpdateStatusRequest),
    RaiseHand(RaiseHandRequest),
    ChatMessage(String),
    SendReaction(ReactionRequest),
    StartSharing(StartSharingRequest),
    StopSharing,
}

/// 受信フレームの解析エラー
#[derive(Debug, Error)]
#[error("invalid frame (event: {event:?}): {source}")]
pub struct FrameError {
    /// `event` まで読めた場合のイベント名
    pub event: Option<String>,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ClientMessage {
    /// テキストフレームを解析する
    ///
    /// `event` が読めた後の失敗では、エラーにイベント名が残る。
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let frame: RawFrame =
            serde_json::from_str(text).map_err(|source| FrameError { event: None, source })?;
        let event = frame.event.clone();
        Self::from_frame(frame).map_err(|source| FrameError {
            event: Some(event),
            source,
        })
    }

    fn from_frame(frame: RawFrame) -> serde_json::Result<Self> {
        let RawFrame { event, data } = frame;
        Ok(match event.as_str() {
            "createRoom" => Self::CreateRoom(or_default(data)?),
            "joinRoom" => Self::JoinRoom(or_default(data)?),
            "leaveRoom" => Self::LeaveRoom,
            "signal" => Self::Signal(required(data)?),
            "signal-screen" => Self::SignalScreen(required(data)?),
            "updateStatus" => Self::UpdateStatus(required(data)?),
            "raiseHand" => Self::RaiseHand(required(data)?),
            "chatMessage" => Self::ChatMessage(required(data)?),
            "sendReaction" => Self::SendReaction(required(data)?),
            "start-sharing" => Self::StartSharing(or_default(data)?),
            "stop-sharing" => Self::StopSharing,
            other => return Err(de::Error::custom(format!("unknown event '{other}'"))),
        })
    }

    /// ログ出力用のイベント名
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "createRoom",
            Self::JoinRoom(_) => "joinRoom",
            Self::LeaveRoom => "leaveRoom",
            Self::Signal(_) => "signal",
            Self::SignalScreen(_) => "signal-screen",
            Self::UpdateStatus(_) => "updateStatus",
            Self::RaiseHand(_) => "raiseHand",
            Self::ChatMessage(_) => "chatMessage",
            Self::SendReaction(_) => "sendReaction",
            Self::StartSharing(_) => "start-sharing",
            Self::StopSharing => "stop-sharing",
        }
    }
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let frame = RawFrame::deserialize(deserializer)?;
        Self::from_frame(frame).map_err(de::Error::custom)
    }
}

fn or_default<T: DeserializeOwned + Default>(data: Option<Value>) -> serde_json::Result<T> {
    match data {
        None => Ok(T::default()),
        Some(value) => serde_json::from_value(value),
    }
}

fn required<T: DeserializeOwned>(data: Option<Value>) -> serde_json::Result<T> {
    serde_json::from_value(data.unwrap_or(Value::Null))
}

/// 数値や真偽値も文字列として受け付ける
fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!("expected a string, found {other}"))),
    }
}

fn loose_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRoomRequest {
    #[serde(deserialize_with = "loose_string")]
    pub room_id: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub password: Option<String>,
    #[serde(deserialize_with = "loose_flag")]
    pub auto_join: bool,
    #[serde(deserialize_with = "loose_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRoomRequest {
    #[serde(deserialize_with = "loose_string")]
    pub room_id: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub password: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalRequest {
    pub to: String,
    pub signal: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScreenSignalRequest {
    pub to: String,
    pub signal: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub id: String,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub audio_on: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RaiseHandRequest {
    pub raised: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StartSharingRequest {
    #[serde(deserialize_with = "loose_string")]
    pub name: Option<String>,
}

// ========================================
// Server → Client
// ========================================

/// Events pushed by the relay.
///
/// `Deserialize` is derived as well so that test clients can decode frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected(ConnectedDto),
    #[serde(rename = "createRoom-ack")]
    CreateRoomAck(AckDto),
    #[serde(rename = "joinRoom-ack")]
    JoinRoomAck(AckDto),
    #[serde(rename = "existing-users")]
    ExistingUsers(Vec<MemberDto>),
    #[serde(rename = "chatHistory")]
    ChatHistory(Vec<ChatMessageDto>),
    #[serde(rename = "memberList")]
    MemberList(Vec<MemberDto>),
    #[serde(rename = "user-connected")]
    UserConnected(PeerDto),
    /// Bare member id string.
    #[serde(rename = "user-disconnected")]
    UserDisconnected(String),
    #[serde(rename = "signal")]
    Signal(SignalDto),
    #[serde(rename = "signal-screen-reply")]
    SignalScreenReply(ScreenReplyDto),
    #[serde(rename = "peer-status-update")]
    PeerStatusUpdate(StatusUpdateDto),
    #[serde(rename = "peer-audio-update")]
    PeerAudioUpdate(AudioUpdateDto),
    #[serde(rename = "chatMessage")]
    ChatMessage(ChatMessageDto),
    #[serde(rename = "receiveReaction")]
    ReceiveReaction(ReactionDto),
    #[serde(rename = "sharing-started-you")]
    SharingStartedYou(SharingStartedDto),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedDto {
    pub id: String,
}

/// createRoom / joinRoom の応答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckDto {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// Error code, e.g. `BadPassword`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// memberList / existing-users の要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: String,
    pub name: String,
    pub status: MemberStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_on: Option<bool>,
    #[serde(default)]
    pub hand_raised: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    /// Sender's connection id
    pub id: String,
    pub name: String,
    pub text: String,
    /// Unix epoch milliseconds
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDto {
    pub from: String,
    pub signal: serde_json::Value,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReplyDto {
    pub from: String,
    pub signal: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateDto {
    pub id: String,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioUpdateDto {
    pub id: String,
    pub audio_on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDto {
    pub emoji: String,
    pub from_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingStartedDto {
    pub screen_share_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_room_with_missing_fields() {
        // テスト項目: joinRoom の省略可能なフィールドは None になる
        // given (前提条件):
        let raw = r#"{"event":"joinRoom","data":{"roomId":"ABC123"}}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::JoinRoom(JoinRoomRequest {
                room_id: Some("ABC123".to_string()),
                password: None,
                name: None,
            })
        );
    }

    #[test]
    fn test_parse_events_without_payload() {
        // テスト項目: data を持たないイベントを解析できる
        // given (前提条件):
        let leave = r#"{"event":"leaveRoom"}"#;
        let stop = r#"{"event":"stop-sharing"}"#;

        // when (操作):
        let leave: ClientMessage = serde_json::from_str(leave).unwrap();
        let stop: ClientMessage = serde_json::from_str(stop).unwrap();

        // then (期待する結果):
        assert_eq!(leave, ClientMessage::LeaveRoom);
        assert_eq!(stop, ClientMessage::StopSharing);
    }

    #[test]
    fn test_parse_requests_without_data_use_defaults() {
        // テスト項目: data が省略・null のリクエストは既定値として解析される
        // given (前提条件):
        let join = r#"{"event":"joinRoom"}"#;
        let create = r#"{"event":"createRoom","data":null}"#;
        let share = r#"{"event":"start-sharing"}"#;

        // when (操作):
        let join: ClientMessage = serde_json::from_str(join).unwrap();
        let create: ClientMessage = serde_json::from_str(create).unwrap();
        let share: ClientMessage = serde_json::from_str(share).unwrap();

        // then (期待する結果):
        assert_eq!(join, ClientMessage::JoinRoom(JoinRoomRequest::default()));
        assert_eq!(create, ClientMessage::CreateRoom(CreateRoomRequest::default()));
        assert_eq!(
            share,
            ClientMessage::StartSharing(StartSharingRequest::default())
        );
    }

    #[test]
    fn test_parse_numeric_fields_as_strings() {
        // テスト項目: 数値のパスワードや Room ID は文字列として受け付ける
        // given (前提条件):
        let raw = r#"{"event":"joinRoom","data":{"roomId":123456,"password":999999,"name":null}}"#;

        // when (操作):
        let message = ClientMessage::decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::JoinRoom(JoinRoomRequest {
                room_id: Some("123456".to_string()),
                password: Some("999999".to_string()),
                name: None,
            })
        );
    }

    #[test]
    fn test_parse_auto_join_truthy_values() {
        // テスト項目: autoJoin は真偽値以外も真偽として解釈される
        // given (前提条件):
        let raw = r#"{"event":"createRoom","data":{"autoJoin":1,"name":"Alice"}}"#;

        // when (操作):
        let message = ClientMessage::decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::CreateRoom(CreateRoomRequest {
                auto_join: true,
                name: Some("Alice".to_string()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_decode_error_keeps_event_name() {
        // テスト項目: data の解析に失敗してもイベント名はエラーに残る
        // given (前提条件):
        let bad_payload = r#"{"event":"joinRoom","data":{"roomId":{"nested":true}}}"#;
        let not_json = "not json";

        // when (操作):
        let bad_payload = ClientMessage::decode(bad_payload).unwrap_err();
        let not_json = ClientMessage::decode(not_json).unwrap_err();

        // then (期待する結果):
        assert_eq!(bad_payload.event.as_deref(), Some("joinRoom"));
        assert_eq!(not_json.event, None);
    }

    #[test]
    fn test_parse_signal_without_data_fails() {
        // テスト項目: 必須の data を持つイベントは data 省略で解析エラーになる
        // given (前提条件):
        let raw = r#"{"event":"signal"}"#;

        // when (操作):
        let result = ClientMessage::decode(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap_err().event.as_deref(), Some("signal"));
    }

    #[test]
    fn test_parse_chat_message_as_plain_string() {
        // テスト項目: chatMessage の data は文字列として解析される
        // given (前提条件):
        let raw = r#"{"event":"chatMessage","data":"hello"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(message, ClientMessage::ChatMessage("hello".to_string()));
    }

    #[test]
    fn test_parse_update_status_with_audio_only() {
        // テスト項目: updateStatus は audioOn のみの部分更新を表現できる
        // given (前提条件):
        let raw = r#"{"event":"updateStatus","data":{"id":"alice","audioOn":false}}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::UpdateStatus(UpdateStatusRequest {
                id: "alice".to_string(),
                status: None,
                audio_on: Some(false),
            })
        );
    }

    #[test]
    fn test_parse_unknown_event_fails() {
        // テスト項目: 未知のイベントは解析エラーになる
        // given (前提条件):
        let raw = r#"{"event":"explode","data":{}}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientMessage>(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_user_disconnected_as_bare_string() {
        // テスト項目: user-disconnected の data はメンバー ID の文字列になる
        // given (前提条件):
        let message = ServerMessage::UserDisconnected("bob".to_string());

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"event": "user-disconnected", "data": "bob"}));
    }

    #[test]
    fn test_serialize_failed_ack_omits_room_id() {
        // テスト項目: 失敗応答には roomId が含まれない
        // given (前提条件):
        let message = ServerMessage::JoinRoomAck(AckDto {
            success: false,
            room_id: None,
            reason: Some("BadPassword".to_string()),
            message: Some("Incorrect password".to_string()),
        });

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "joinRoom-ack",
                "data": {"success": false, "reason": "BadPassword", "message": "Incorrect password"}
            })
        );
    }

    #[test]
    fn test_serialize_member_with_camel_case_fields() {
        // テスト項目: メンバーのフィールドは camelCase で出力される
        // given (前提条件):
        let message = ServerMessage::MemberList(vec![MemberDto {
            id: "alice".to_string(),
            name: "Alice".to_string(),
            status: MemberStatus::On,
            audio_on: Some(true),
            hand_raised: false,
        }]);

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "memberList",
                "data": [{"id": "alice", "name": "Alice", "status": "on", "audioOn": true, "handRaised": false}]
            })
        );
    }
}
