//! 値オブジェクト（Value Object）
//!
//! 識別子・表示名・チャット本文など、ドメインで扱う不変の値を定義します。
//! 生成時にバリデーションとサニタイズを行い、以降は常に有効な値として扱えます。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// 画面共有用の仮想メンバー ID に付与するサフィックス（ワイヤ互換のため固定）
pub const SCREEN_SHARE_SUFFIX: &str = "_screen";

/// 表示名の最大文字数
pub const DISPLAY_NAME_MAX_CHARS: usize = 64;

/// チャット本文の最大文字数
pub const CHAT_TEXT_MAX_CHARS: usize = 1000;

/// リアクション（絵文字）の最大文字数
pub const EMOJI_MAX_CHARS: usize = 16;

/// Escape characters that are significant in HTML markup.
pub fn escape_markup(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}

// ========================================
// ConnectionId
// ========================================

/// トランスポート層の接続 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(value))
    }

    /// 新しい接続 ID を発行する（UUID v4 の simple 形式）
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// MemberId
// ========================================

/// Room のメンバーシップにおけるメンバー ID
///
/// 実メンバーは接続 ID と同じ値、仮想画面共有メンバーは
/// 接続 ID に [`SCREEN_SHARE_SUFFIX`] を付与した値を持ちます。
/// 種別の判定には ID ではなく [`crate::domain::MemberKind`] を使います。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::MemberIdEmpty);
        }
        Ok(Self(value))
    }

    /// Deterministic id of the virtual member representing `owner`'s screen share.
    pub fn screen_share_of(owner: &ConnectionId) -> Self {
        Self(format!("{}{}", owner.as_str(), SCREEN_SHARE_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&ConnectionId> for MemberId {
    fn from(connection_id: &ConnectionId) -> Self {
        Self(connection_id.as_str().to_string())
    }
}

impl TryFrom<String> for MemberId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// RoomId
// ========================================

/// Room ID（アクティブな Room の間で一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// 前後の空白を除去した値で RoomId を生成する
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Factory 専用（生成済みの値は常に有効）
    pub(super) fn from_generated(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// Password
// ========================================

/// Room パスワード（空文字列も有効）
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Password(String);

impl Password {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// 完全一致のみを許可する
    pub fn matches(&self, candidate: &Password) -> bool {
        self.0 == candidate.0
    }
}

impl From<Option<String>> for Password {
    fn from(value: Option<String>) -> Self {
        Self(value.unwrap_or_default())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

// ========================================
// DisplayName
// ========================================

/// 参加者の表示名（前後の空白を除去し、最大 64 文字）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = truncate_chars(value.trim(), DISPLAY_NAME_MAX_CHARS);
        if trimmed.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an optional name, falling back to `fallback` when it is absent or blank.
    pub fn parse_or(value: Option<String>, fallback: &str) -> Self {
        value
            .and_then(|v| Self::new(v).ok())
            .unwrap_or_else(|| Self(fallback.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// マークアップ文字をエスケープした表示名
    pub fn sanitized(&self) -> String {
        escape_markup(&self.0)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// MemberStatus
// ========================================

/// カメラ／プレゼンス状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// 参加直後（カメラ取得待ち）
    Pending,
    On,
    Off,
    /// 仮想画面共有メンバー専用
    Sharing,
}

// ========================================
// ChatText
// ========================================

/// サニタイズ済みのチャット本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatText(String);

impl ChatText {
    /// Trim, truncate to [`CHAT_TEXT_MAX_CHARS`], then escape markup.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let truncated = truncate_chars(trimmed, CHAT_TEXT_MAX_CHARS);
        Some(Self(escape_markup(truncated)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ========================================
// Emoji
// ========================================

/// リアクションとして送られる絵文字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji(String);

impl Emoji {
    pub fn sanitize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(escape_markup(truncate_chars(trimmed, EMOJI_MAX_CHARS))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ========================================
// Timestamp
// ========================================

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

// ========================================
// SignalPayload
// ========================================

/// Coarse classification of a negotiation payload, used only for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
    Generic,
}

/// WebRTC ネゴシエーションのペイロード（中身は解釈せずに中継する）
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPayload(serde_json::Value);

impl SignalPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn kind(&self) -> SignalKind {
        match self.0.get("type").and_then(serde_json::Value::as_str) {
            Some("offer") => SignalKind::Offer,
            Some("answer") => SignalKind::Answer,
            _ if self.0.get("candidate").is_some() => SignalKind::Candidate,
            _ => SignalKind::Generic,
        }
    }

    /// 初回 offer 以外はすべて応答側の信号として扱う
    pub fn is_reply(&self) -> bool {
        self.kind() != SignalKind::Offer
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}
