//! エンティティ（Entity）
//!
//! - `Room`: パスワード付きの会議室。メンバーシップとチャット履歴を持つ
//! - `Member`: Room のメンバー。実参加者か仮想画面共有メンバーのどちらか
//! - `Connection`: トランスポート接続と、その接続が参加している Room の紐付け
//! - `ChatMessage`: チャット履歴の 1 件

use std::collections::VecDeque;

use super::{
    error::RoomError,
    value_object::{
        ChatText, ConnectionId, DisplayName, MemberId, MemberStatus, Password, RoomId, Timestamp,
    },
};

/// チャット履歴の保持件数（超過分は古いものから破棄）
pub const CHAT_HISTORY_LIMIT: usize = 500;

// ========================================
// Member
// ========================================

/// Presence indicators of a real participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub status: MemberStatus,
    pub audio_on: Option<bool>,
    pub hand_raised: bool,
}

impl Presence {
    /// 参加直後の状態（カメラ取得待ち）
    pub fn joining() -> Self {
        Self {
            status: MemberStatus::Pending,
            audio_on: None,
            hand_raised: false,
        }
    }
}

/// メンバーの種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// 接続を持つ実参加者
    Real {
        connection: ConnectionId,
        presence: Presence,
    },
    /// 実参加者の画面共有を表す仮想メンバー
    ///
    /// `owner` はシグナリングの応答先を解決するためだけに使い、所有関係は表さない。
    ScreenShare { owner: ConnectionId },
}

/// Room のメンバー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: DisplayName,
    pub kind: MemberKind,
}

impl Member {
    /// 実参加者を生成する（ID は接続 ID と同じ）
    pub fn real(connection: &ConnectionId, name: DisplayName) -> Self {
        Self {
            id: MemberId::from(connection),
            name,
            kind: MemberKind::Real {
                connection: connection.clone(),
                presence: Presence::joining(),
            },
        }
    }

    /// 画面共有の仮想メンバーを生成する
    pub fn screen_share(owner: &ConnectionId, name: DisplayName) -> Self {
        Self {
            id: MemberId::screen_share_of(owner),
            name,
            kind: MemberKind::ScreenShare {
                owner: owner.clone(),
            },
        }
    }

    pub fn status(&self) -> MemberStatus {
        match &self.kind {
            MemberKind::Real { presence, .. } => presence.status,
            MemberKind::ScreenShare { .. } => MemberStatus::Sharing,
        }
    }

    pub fn audio_on(&self) -> Option<bool> {
        match &self.kind {
            MemberKind::Real { presence, .. } => presence.audio_on,
            MemberKind::ScreenShare { .. } => None,
        }
    }

    pub fn hand_raised(&self) -> bool {
        match &self.kind {
            MemberKind::Real { presence, .. } => presence.hand_raised,
            MemberKind::ScreenShare { .. } => false,
        }
    }

    pub fn presence_mut(&mut self) -> Option<&mut Presence> {
        match &mut self.kind {
            MemberKind::Real { presence, .. } => Some(presence),
            MemberKind::ScreenShare { .. } => None,
        }
    }

    /// 配信先となる接続（仮想メンバーは接続を持たない）
    pub fn connection(&self) -> Option<&ConnectionId> {
        match &self.kind {
            MemberKind::Real { connection, .. } => Some(connection),
            MemberKind::ScreenShare { .. } => None,
        }
    }

    pub fn screen_share_owner(&self) -> Option<&ConnectionId> {
        match &self.kind {
            MemberKind::Real { .. } => None,
            MemberKind::ScreenShare { owner } => Some(owner),
        }
    }

    pub fn is_screen_share(&self) -> bool {
        matches!(self.kind, MemberKind::ScreenShare { .. })
    }
}

// ========================================
// ChatMessage
// ========================================

/// チャットメッセージ（追加後は不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: ConnectionId,
    /// エスケープ済みの送信者名
    pub sender_name: String,
    pub text: ChatText,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(from: ConnectionId, sender: &DisplayName, text: ChatText, timestamp: Timestamp) -> Self {
        Self {
            from,
            sender_name: sender.sanitized(),
            text,
            timestamp,
        }
    }
}

// ========================================
// Room
// ========================================

/// パスワード付きの会議室
///
/// メンバーは参加順に保持されます。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    password: Password,
    members: Vec<Member>,
    chat: VecDeque<ChatMessage>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, password: Password, created_at: Timestamp) -> Self {
        Self {
            id,
            password,
            members: Vec::new(),
            chat: VecDeque::new(),
            created_at,
        }
    }

    pub fn verify_password(&self, candidate: &Password) -> bool {
        self.password.matches(candidate)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Add a member, replacing any entry with the same id in place.
    ///
    /// A screen-share member is only accepted while its owner is a real member of this room.
    /// Returns the replaced member, if any.
    pub fn upsert_member(&mut self, member: Member) -> Result<Option<Member>, RoomError> {
        if let Some(owner) = member.screen_share_owner()
            && !self.has_connection(owner)
        {
            return Err(RoomError::ScreenShareOwnerMissing(owner.to_string()));
        }

        match self.members.iter_mut().find(|m| m.id == member.id) {
            Some(existing) => Ok(Some(std::mem::replace(existing, member))),
            None => {
                self.members.push(member);
                Ok(None)
            }
        }
    }

    /// 指定したメンバーを削除する
    ///
    /// 実メンバーを削除する場合、その画面共有メンバーも同時に削除される。
    pub fn remove_member(&mut self, id: &MemberId) -> Vec<Member> {
        match self.member(id).and_then(Member::connection).cloned() {
            Some(connection) => self.remove_connection(&connection),
            None => self
                .members
                .iter()
                .position(|m| &m.id == id)
                .map(|index| vec![self.members.remove(index)])
                .unwrap_or_default(),
        }
    }

    /// Remove everything owned by `connection`: its screen share first, then the real member.
    pub fn remove_connection(&mut self, connection: &ConnectionId) -> Vec<Member> {
        let mut removed = Vec::with_capacity(2);
        if let Some(index) = self
            .members
            .iter()
            .position(|m| m.screen_share_owner() == Some(connection))
        {
            removed.push(self.members.remove(index));
        }
        if let Some(index) = self
            .members
            .iter()
            .position(|m| m.connection() == Some(connection))
        {
            removed.push(self.members.remove(index));
        }
        removed
    }

    pub fn screen_share_of(&self, owner: &ConnectionId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.screen_share_owner() == Some(owner))
    }

    pub fn has_connection(&self, connection: &ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| m.connection() == Some(connection))
    }

    /// 実メンバーの接続 ID 一覧（Room 宛て配信の宛先）
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.members
            .iter()
            .filter_map(Member::connection)
            .cloned()
            .collect()
    }

    /// メッセージを履歴に追加し、上限を超えた分は古い順に破棄する
    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat.push_back(message);
        while self.chat.len() > CHAT_HISTORY_LIMIT {
            self.chat.pop_front();
        }
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.iter().cloned().collect()
    }

    pub fn chat_len(&self) -> usize {
        self.chat.len()
    }
}

// ========================================
// Connection
// ========================================

/// 接続が参加している Room と表示名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBinding {
    pub room_id: RoomId,
    pub name: DisplayName,
}

/// トランスポート接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub binding: Option<RoomBinding>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            binding: None,
            connected_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    fn create_test_room() -> Room {
        Room::new(
            RoomId::new("ABC123".to_string()).unwrap(),
            Password::new("999999".to_string()),
            Timestamp::new(1000),
        )
    }

    fn chat(from: &ConnectionId, text: &str) -> ChatMessage {
        ChatMessage::new(
            from.clone(),
            &name("alice"),
            ChatText::sanitize(text).unwrap(),
            Timestamp::new(1000),
        )
    }

    #[test]
    fn test_real_member_starts_pending() {
        // テスト項目: 実メンバーは pending 状態で作成され、ID は接続 ID と一致する
        // given (前提条件):
        let alice = conn("alice");

        // when (操作):
        let member = Member::real(&alice, name("Alice"));

        // then (期待する結果):
        assert_eq!(member.id.as_str(), "alice");
        assert_eq!(member.status(), MemberStatus::Pending);
        assert_eq!(member.audio_on(), None);
        assert!(!member.hand_raised());
        assert_eq!(member.connection(), Some(&alice));
    }

    #[test]
    fn test_screen_share_member_is_sharing_without_connection() {
        // テスト項目: 画面共有メンバーは sharing 状態で、接続を持たない
        // given (前提条件):
        let alice = conn("alice");

        // when (操作):
        let member = Member::screen_share(&alice, name("Alice (Screen)"));

        // then (期待する結果):
        assert_eq!(member.id.as_str(), "alice_screen");
        assert_eq!(member.status(), MemberStatus::Sharing);
        assert_eq!(member.connection(), None);
        assert_eq!(member.screen_share_owner(), Some(&alice));
    }

    #[test]
    fn test_upsert_member_keeps_join_order() {
        // テスト項目: メンバーは参加順に保持され、同じ ID の追加は置き換えになる
        // given (前提条件):
        let mut room = create_test_room();
        let alice = conn("alice");
        let bob = conn("bob");
        room.upsert_member(Member::real(&bob, name("Bob"))).unwrap();
        room.upsert_member(Member::real(&alice, name("Alice"))).unwrap();

        // when (操作):
        let replaced = room
            .upsert_member(Member::real(&bob, name("Bobby")))
            .unwrap();

        // then (期待する結果):
        assert_eq!(replaced.map(|m| m.name), Some(name("Bob")));
        let ids: Vec<&str> = room.members().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "alice"]);
        assert_eq!(room.members()[0].name, name("Bobby"));
    }

    #[test]
    fn test_screen_share_requires_owner_in_room() {
        // テスト項目: 所有者が Room にいない画面共有メンバーは追加できない
        // given (前提条件):
        let mut room = create_test_room();
        let stranger = conn("stranger");

        // when (操作):
        let result = room.upsert_member(Member::screen_share(&stranger, name("Screen")));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomError::ScreenShareOwnerMissing("stranger".to_string()))
        );
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_connection_removes_screen_share_first() {
        // テスト項目: 接続の削除では画面共有メンバー、実メンバーの順に削除される
        // given (前提条件):
        let mut room = create_test_room();
        let alice = conn("alice");
        room.upsert_member(Member::real(&alice, name("Alice"))).unwrap();
        room.upsert_member(Member::screen_share(&alice, name("Screen")))
            .unwrap();

        // when (操作):
        let removed = room.remove_connection(&alice);

        // then (期待する結果):
        let ids: Vec<&str> = removed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["alice_screen", "alice"]);
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_real_member_cascades_to_screen_share() {
        // テスト項目: 実メンバーを削除すると画面共有メンバーも削除され、不変条件が保たれる
        // given (前提条件):
        let mut room = create_test_room();
        let alice = conn("alice");
        let bob = conn("bob");
        room.upsert_member(Member::real(&alice, name("Alice"))).unwrap();
        room.upsert_member(Member::real(&bob, name("Bob"))).unwrap();
        room.upsert_member(Member::screen_share(&alice, name("Screen")))
            .unwrap();

        // when (操作):
        let removed = room.remove_member(&MemberId::from(&alice));

        // then (期待する結果):
        assert_eq!(removed.len(), 2);
        assert_eq!(room.member_count(), 1);
        assert!(room.screen_share_of(&alice).is_none());
    }

    #[test]
    fn test_remove_screen_share_member_only() {
        // テスト項目: 画面共有メンバーだけを削除しても実メンバーは残る
        // given (前提条件):
        let mut room = create_test_room();
        let alice = conn("alice");
        room.upsert_member(Member::real(&alice, name("Alice"))).unwrap();
        room.upsert_member(Member::screen_share(&alice, name("Screen")))
            .unwrap();

        // when (操作):
        let removed = room.remove_member(&MemberId::screen_share_of(&alice));

        // then (期待する結果):
        assert_eq!(removed.len(), 1);
        assert!(room.has_connection(&alice));
        assert_eq!(room.connections(), vec![alice]);
    }

    #[test]
    fn test_chat_history_is_bounded_fifo() {
        // テスト項目: チャット履歴は 500 件を超えると古いものから破棄される
        // given (前提条件):
        let mut room = create_test_room();
        let alice = conn("alice");

        // when (操作):
        for i in 0..(CHAT_HISTORY_LIMIT + 3) {
            room.push_message(chat(&alice, &format!("message {i}")));
        }

        // then (期待する結果):
        assert_eq!(room.chat_len(), CHAT_HISTORY_LIMIT);
        let history = room.chat_history();
        assert_eq!(history[0].text.as_str(), "message 3");
        assert_eq!(
            history[CHAT_HISTORY_LIMIT - 1].text.as_str(),
            format!("message {}", CHAT_HISTORY_LIMIT + 2)
        );
    }

    #[test]
    fn test_verify_password() {
        // テスト項目: Room のパスワード検証は完全一致のみ成功する
        // given (前提条件):
        let room = create_test_room();

        // when (操作) / then (期待する結果):
        assert!(room.verify_password(&Password::new("999999".to_string())));
        assert!(!room.verify_password(&Password::new("000000".to_string())));
    }
}
