// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct messaging models.

use serde::{Deserialize, Serialize};

/// A two-member chat. One chat per user pair: the document ID is the
/// sorted pair `{low}_{high}`, so get-or-create is race-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Chat ID (also used as document ID)
    pub id: String,
    /// Lexicographically smaller member ID
    pub member_a: String,
    /// Lexicographically larger member ID
    pub member_b: String,
    /// Preview of the most recent message
    #[serde(default)]
    pub last_message: Option<String>,
    /// When the most recent message was sent (RFC3339)
    #[serde(default)]
    pub last_message_at: Option<String>,
    /// When the chat was created (RFC3339)
    pub created_at: String,
}

impl ChatRecord {
    /// Deterministic chat ID for a user pair, order-independent.
    pub fn pair_id(user_a: &str, user_b: &str) -> String {
        if user_a <= user_b {
            format!("{}_{}", user_a, user_b)
        } else {
            format!("{}_{}", user_b, user_a)
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.member_a == user_id || self.member_b == user_id
    }
}

/// A single message within a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message ID (also used as document ID)
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    /// When the message was sent (RFC3339; cursor sort key)
    pub sent_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_id_is_order_independent() {
        assert_eq!(ChatRecord::pair_id("alice", "bob"), "alice_bob");
        assert_eq!(ChatRecord::pair_id("bob", "alice"), "alice_bob");
    }
}
