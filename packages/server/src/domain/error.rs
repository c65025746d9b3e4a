//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの生成に失敗した場合のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("connection id must not be empty")]
    ConnectionIdEmpty,

    #[error("member id must not be empty")]
    MemberIdEmpty,

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("display name must not be empty")]
    DisplayNameEmpty,
}

/// Room エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// 画面共有メンバーの所有者が同じ Room に存在しない
    #[error("screen share owner '{0}' is not a member of the room")]
    ScreenShareOwnerMissing(String),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("room '{0}' already exists")]
    DuplicateRoom(String),

    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error(transparent)]
    Room(#[from] RoomError),
}

/// MessagePusher 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    EncodeFailed(String),
}
