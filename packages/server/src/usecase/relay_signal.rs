//! UseCase: WebRTC シグナリングの中継
//!
//! ペイロードの中身は解釈せず、宛先の種別と offer / それ以外の区別だけで配送経路を決めます。
//! 中継は fire-and-forget で、応答を待つことも再送することもありません。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, Member, MemberId, MemberKind, Notification, RoomId,
    RoomRepository, SignalPayload,
};

use super::{broadcaster::EventBroadcaster, error::RequestError};

/// シグナルの配送結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalRoute {
    /// 宛先の接続に `signal` として配送
    Direct(ConnectionId),
    /// 仮想画面共有メンバー宛ての応答を、所有者に `signal-screen-reply` として配送
    ScreenReply(ConnectionId),
    /// 配送先なし（送信者が Room にいない、宛先が Room にいない等）
    Dropped,
}

#[derive(Clone)]
pub struct RelaySignalUseCase {
    rooms: Arc<dyn RoomRepository>,
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
}

impl RelaySignalUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        connections: Arc<dyn ConnectionRepository>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            rooms,
            connections,
            broadcaster,
        }
    }

    /// 送信者自身（実メンバー）としてシグナルを中継する
    pub async fn execute(
        &self,
        from: &ConnectionId,
        to: String,
        signal: SignalPayload,
    ) -> Result<SignalRoute, RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Dropping signal from '{}': not in a room", from);
            return Ok(SignalRoute::Dropped);
        };
        let Some(target) = self.resolve_target(&binding.room_id, to).await? else {
            return Ok(SignalRoute::Dropped);
        };

        let route = match target.kind {
            MemberKind::ScreenShare { owner } if signal.is_reply() => {
                self.broadcaster
                    .send_to(
                        &owner,
                        &Notification::ScreenSignalReply {
                            from: MemberId::from(from),
                            signal,
                        },
                    )
                    .await;
                SignalRoute::ScreenReply(owner)
            }
            MemberKind::ScreenShare { .. } => {
                tracing::debug!("Dropping offer addressed to screen share '{}'", target.id);
                SignalRoute::Dropped
            }
            MemberKind::Real { connection, .. } => {
                self.broadcaster
                    .send_to(
                        &connection,
                        &Notification::Signal {
                            from: MemberId::from(from),
                            signal,
                            name: binding.name,
                        },
                    )
                    .await;
                SignalRoute::Direct(connection)
            }
        };

        tracing::debug!("Relayed signal from '{}': {:?}", from, route);
        Ok(route)
    }

    /// 送信者の画面共有（仮想メンバー）としてシグナルを中継する
    ///
    /// 送信者が画面共有中でなければ何もしない。
    pub async fn execute_as_screen(
        &self,
        from: &ConnectionId,
        to: String,
        signal: SignalPayload,
    ) -> Result<SignalRoute, RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Dropping screen signal from '{}': not in a room", from);
            return Ok(SignalRoute::Dropped);
        };
        let Some(screen) = self.rooms.find_screen_share(&binding.room_id, from).await? else {
            tracing::debug!("Dropping screen signal from '{}': not sharing", from);
            return Ok(SignalRoute::Dropped);
        };
        let Some(connection) = self
            .resolve_target(&binding.room_id, to)
            .await?
            .and_then(|m| m.connection().cloned())
        else {
            return Ok(SignalRoute::Dropped);
        };

        self.broadcaster
            .send_to(
                &connection,
                &Notification::Signal {
                    from: screen.id,
                    signal,
                    name: screen.name,
                },
            )
            .await;
        Ok(SignalRoute::Direct(connection))
    }

    async fn resolve_target(
        &self,
        room_id: &RoomId,
        to: String,
    ) -> Result<Option<Member>, RequestError> {
        let Ok(target_id) = MemberId::new(to) else {
            return Ok(None);
        };
        let target = self.rooms.find_member(room_id, &target_id).await?;
        if target.is_none() {
            tracing::debug!("Signal target '{}' is not in room '{}'", target_id, room_id);
        }
        Ok(target)
    }
}
