//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::MemberStatus;

/// `GET /api/rooms` の要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    /// Display names in join order
    pub members: Vec<String>,
    pub member_count: usize,
    /// RFC 3339
    pub created_at: String,
}

/// `GET /api/rooms/{room_id}` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<MemberDetailDto>,
    pub chat_count: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDetailDto {
    pub id: String,
    pub name: String,
    pub status: MemberStatus,
    pub kind: MemberKindDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKindDto {
    Real,
    ScreenShare,
}
