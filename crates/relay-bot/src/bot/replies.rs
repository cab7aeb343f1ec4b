//! User-facing reply texts

use std::fmt;

/// Reply sent back to the chat after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Usage text for `/start`
    Welcome,
    /// The command needs a non-empty text
    Usage { command: &'static str },
    /// The account has no locations
    NoProfiles,
    /// `/post` succeeded
    Posted,
    /// `/post` failed on the first location
    PostFailed,
    /// `/allpost` finished; `posted` out of `attempted` succeeded
    Broadcast { posted: usize, attempted: usize },
    /// Anything that went wrong before posting; details stay in the logs
    Failure,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome => write!(
                f,
                "👋 Welcome! Use:\n\n\
                 /post <text> - post to the first business profile\n\
                 /allpost <text> - post to ALL profiles"
            ),
            Reply::Usage { command } => write!(f, "❌ Usage: /{command} <your update text>"),
            Reply::NoProfiles => write!(f, "❌ No business profiles found."),
            Reply::Posted => write!(f, "✅ Posted to 1st profile."),
            Reply::PostFailed => write!(f, "❌ Failed to post."),
            Reply::Broadcast { posted, attempted } => {
                write!(f, "✅ Posted to {posted} profile(s) out of {attempted}.")
            }
            Reply::Failure => write!(f, "❌ Something went wrong. Please try again later."),
        }
    }
}
