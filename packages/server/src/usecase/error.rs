//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{Rejection, RepositoryError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error("failed to register connection: {0}")]
    Registry(String),
}

/// createRoom / joinRoom の失敗理由
///
/// 応答（ack）で同期的に返される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Room '{0}' already exists")]
    DuplicateRoom(String),

    #[error("Incorrect password")]
    BadPassword,

    #[error("Room id is required")]
    MissingRoomId,

    /// 内部エラー。詳細はログにのみ出力し、クライアントには返さない
    #[error("Internal server error")]
    ServerFault(String),
}

impl RequestError {
    /// ack の `reason` に載せるエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "RoomNotFound",
            Self::DuplicateRoom(_) => "DuplicateRoom",
            Self::BadPassword => "BadPassword",
            Self::MissingRoomId => "MissingRoomId",
            Self::ServerFault(_) => "ServerFault",
        }
    }

    pub fn rejection(&self) -> Rejection {
        Rejection {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<RepositoryError> for RequestError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(id) => Self::RoomNotFound(id),
            RepositoryError::DuplicateRoom(id) => Self::DuplicateRoom(id),
            other => Self::ServerFault(other.to_string()),
        }
    }
}
