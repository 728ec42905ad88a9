//! Player accounts as seen by the lottery core.

use crate::domain::PlayerId;
use crate::error::LotteryError;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// Inactive players cannot buy boards.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Build a player from raw registration fields.
    pub fn register(
        full_name: &str,
        email: &str,
        phone: &str,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LotteryError> {
        let full_name = full_name.trim();
        let name_len = full_name.chars().count();
        if !(3..=100).contains(&name_len) {
            return Err(LotteryError::InvalidPlayer(
                "full name must be between 3 and 100 characters".into(),
            ));
        }

        let email = email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(LotteryError::InvalidPlayer("invalid email address".into()));
        }

        let phone = phone.trim();
        if phone.is_empty() {
            return Err(LotteryError::InvalidPlayer("phone number is required".into()));
        }

        Ok(Player {
            id: PlayerId::new(),
            full_name: full_name.to_string(),
            email: email.to_lowercase(),
            phone: phone.to_string(),
            is_active,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_normalizes_fields() {
        let player = Player::register(" Ada Lovelace ", "Ada@Example.com", "12345678", true, Utc::now())
            .unwrap();
        assert_eq!(player.full_name, "Ada Lovelace");
        assert_eq!(player.email, "ada@example.com");
        assert!(player.is_active);
    }

    #[test]
    fn test_register_rejects_bad_fields() {
        assert!(Player::register("Al", "a@b.dk", "1", false, Utc::now()).is_err());
        assert!(Player::register("Alice", "nope", "1", false, Utc::now()).is_err());
        assert!(Player::register("Alice", "a@b.dk", " ", false, Utc::now()).is_err());
    }
}
