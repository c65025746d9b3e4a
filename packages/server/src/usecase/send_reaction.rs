//! UseCase: リアクション（絵文字）の送信
//!
//! リアクションは履歴に残さず、送信者を含む Room 全員に配信します。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRepository, Emoji, Notification};

use super::{broadcaster::EventBroadcaster, error::RequestError};

#[derive(Clone)]
pub struct SendReactionUseCase {
    connections: Arc<dyn ConnectionRepository>,
    broadcaster: EventBroadcaster,
}

impl SendReactionUseCase {
    pub fn new(connections: Arc<dyn ConnectionRepository>, broadcaster: EventBroadcaster) -> Self {
        Self {
            connections,
            broadcaster,
        }
    }

    pub async fn execute(&self, from: &ConnectionId, emoji: &str) -> Result<(), RequestError> {
        let Some(binding) = self.connections.binding_of(from).await else {
            tracing::debug!("Ignoring reaction from '{}': not in a room", from);
            return Ok(());
        };
        let Some(emoji) = Emoji::sanitize(emoji) else {
            return Ok(());
        };

        self.broadcaster
            .to_room(
                &binding.room_id,
                &Notification::Reaction {
                    emoji,
                    from: from.clone(),
                    name: binding.name,
                },
            )
            .await;
        Ok(())
    }
}
