//! Factory: ドメインオブジェクトの生成
//!
//! Room ID の自動採番を担当します。

use std::collections::HashSet;

use rand::Rng;

use super::value_object::RoomId;

/// 自動採番される Room ID の長さ
pub const ROOM_ID_LENGTH: usize = 6;

/// 見間違えやすい文字（I, O, 0, 1）を除いた英数字
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Room ID の Factory
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// Generate a room id that does not collide with any of `active`.
    ///
    /// Only live rooms are passed in, so ids of destroyed rooms can be handed out again.
    pub fn generate_unique(active: &HashSet<RoomId>) -> RoomId {
        Self::generate_unique_with(&mut rand::thread_rng(), active)
    }

    pub fn generate_unique_with<R: Rng + ?Sized>(rng: &mut R, active: &HashSet<RoomId>) -> RoomId {
        loop {
            let candidate = Self::generate_with(rng);
            if !active.contains(&candidate) {
                return candidate;
            }
            tracing::debug!("Generated room id '{}' collides, retrying", candidate);
        }
    }

    fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> RoomId {
        let id: String = (0..ROOM_ID_LENGTH)
            .map(|_| char::from(ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())]))
            .collect();
        RoomId::from_generated(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_generated_room_id_uses_alphabet() {
        // テスト項目: 自動採番された Room ID は 6 文字で、許可された文字のみを含む
        // given (前提条件):
        let active = HashSet::new();

        // when (操作):
        let room_id = RoomIdFactory::generate_unique(&active);

        // then (期待する結果):
        assert_eq!(room_id.as_str().len(), ROOM_ID_LENGTH);
        assert!(
            room_id
                .as_str()
                .bytes()
                .all(|b| ROOM_ID_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_generated_room_id_avoids_active_rooms() {
        // テスト項目: アクティブな Room と衝突する ID は採番されない
        // given (前提条件): 同じシードで最初に生成される ID を使用中にする
        let first = RoomIdFactory::generate_with(&mut StdRng::seed_from_u64(7));
        let active: HashSet<RoomId> = [first.clone()].into_iter().collect();

        // when (操作):
        let room_id = RoomIdFactory::generate_unique_with(&mut StdRng::seed_from_u64(7), &active);

        // then (期待する結果):
        assert_ne!(room_id, first);
    }
}
