//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, LikeToggle};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Case-insensitive username reservations (keyed by lowercase handle)
    pub const USERNAMES: &str = "usernames";
    pub const HIGHLIGHTS: &str = "highlights";
    /// Normalized like relation (keyed by `{highlight_id}_{user_id}`)
    pub const LIKES: &str = "likes";
    pub const COMMENTS: &str = "comments";
    pub const POSTS: &str = "posts";
    pub const CHATS: &str = "chats";
    pub const MESSAGES: &str = "messages";
}
