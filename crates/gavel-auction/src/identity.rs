//! Identities handed to members and codes handed to rooms.

use rand::Rng;

use gavel_protocol::{RoomCode, UserId};

/// A fresh opaque identity: `user_` followed by 128 random bits in hex.
pub fn generate_user_id() -> UserId {
    let bytes: [u8; 16] = rand::rng().random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    UserId::new(format!("user_{hex}"))
}

/// A random room code drawn from [`RoomCode::ALPHABET`]. Uniqueness is the
/// registry's job.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> Option<RoomCode> {
    let code: String = (0..RoomCode::LEN)
        .map(|_| {
            let index = rng.random_range(0..RoomCode::ALPHABET.len());
            char::from(RoomCode::ALPHABET[index])
        })
        .collect();
    RoomCode::parse(&code).ok()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generate_user_id_shape() {
        let id = generate_user_id();
        let hex = id.as_str().strip_prefix("user_").unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_user_id_is_unique() {
        assert_ne!(generate_user_id(), generate_user_id());
    }

    #[test]
    fn test_generate_room_code_uses_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = generate_room_code(&mut rng).unwrap();
            assert_eq!(code.as_str().len(), RoomCode::LEN);
            assert!(code.as_str().bytes().all(|b| RoomCode::ALPHABET.contains(&b)));
        }
    }
}
