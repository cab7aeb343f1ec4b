//! Command dispatch
//!
//! Every command is single-shot: establish a session, list the locations,
//! post, report. Nothing is carried between commands except what the
//! session provider persists.

pub mod commands;
pub mod replies;

use crate::error::Result;
use relay_auth::{Credential, SessionProvider};
use relay_directory::{Directory, LocationId};
use std::sync::Arc;
use tracing::{error, info, warn};

pub use commands::Command;
pub use replies::Reply;

/// Routes parsed commands to the credential store and the directory
#[derive(Clone)]
pub struct Dispatcher {
    sessions: Arc<dyn SessionProvider>,
    directory: Arc<dyn Directory>,
}

impl Dispatcher {
    pub fn new(sessions: Arc<dyn SessionProvider>, directory: Arc<dyn Directory>) -> Self {
        Self {
            sessions,
            directory,
        }
    }

    /// Run a command to completion and produce its reply
    ///
    /// Never fails: errors are logged and answered with [`Reply::Failure`].
    pub async fn dispatch(&self, command: Command) -> Reply {
        let name = command.name();
        match self.execute(command).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(command = name, "Command failed: {}", e);
                Reply::Failure
            }
        }
    }

    async fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Start => Ok(Reply::Welcome),
            Command::Post { text } => self.post_first(&text).await,
            Command::AllPost { text } => self.post_all(&text).await,
        }
    }

    async fn session_and_locations(&self) -> Result<(Credential, Vec<LocationId>)> {
        let session = self.sessions.ensure_valid_session().await?;
        let locations = self.directory.list_locations(&session).await?;
        Ok((session, locations))
    }

    async fn post_first(&self, text: &str) -> Result<Reply> {
        if text.trim().is_empty() {
            return Ok(Reply::Usage { command: "post" });
        }

        let (session, locations) = self.session_and_locations().await?;
        let Some(first) = locations.first() else {
            warn!("No business profiles found");
            return Ok(Reply::NoProfiles);
        };

        if self.directory.post(first, text, &session).await {
            info!(location = %first, "Posted to first profile");
            Ok(Reply::Posted)
        } else {
            Ok(Reply::PostFailed)
        }
    }

    async fn post_all(&self, text: &str) -> Result<Reply> {
        if text.trim().is_empty() {
            return Ok(Reply::Usage { command: "allpost" });
        }

        let (session, locations) = self.session_and_locations().await?;
        if locations.is_empty() {
            warn!("No business profiles found");
            return Ok(Reply::NoProfiles);
        }

        let mut posted = 0;
        for location in &locations {
            if self.directory.post(location, text, &session).await {
                posted += 1;
            }
        }

        info!(posted, attempted = locations.len(), "Broadcast finished");
        Ok(Reply::Broadcast {
            posted,
            attempted: locations.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLocations, MockSessions, credential, locations, signed_in};
    use mockall::Sequence;
    use relay_auth::AuthError;
    use relay_directory::DirectoryError;

    fn dispatcher(sessions: MockSessions, directory: MockLocations) -> Dispatcher {
        Dispatcher::new(Arc::new(sessions), Arc::new(directory))
    }

    fn post(text: &str) -> Command {
        Command::Post {
            text: text.to_string(),
        }
    }

    fn allpost(text: &str) -> Command {
        Command::AllPost {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_has_no_side_effects() {
        let mut sessions = MockSessions::new();
        sessions.expect_ensure_valid_session().never();
        let mut directory = MockLocations::new();
        directory.expect_list_locations().never();

        let reply = dispatcher(sessions, directory).dispatch(Command::Start).await;
        assert_eq!(reply, Reply::Welcome);
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_remote_calls() {
        for command in [post(""), post("   "), allpost(""), allpost(" \t ")] {
            let mut sessions = MockSessions::new();
            sessions.expect_ensure_valid_session().never();
            let mut directory = MockLocations::new();
            directory.expect_list_locations().never();
            directory.expect_post().never();

            let name = command.name();
            let reply = dispatcher(sessions, directory).dispatch(command).await;
            assert_eq!(reply, Reply::Usage { command: name });
        }
    }

    #[tokio::test]
    async fn test_no_profiles_never_posts() {
        for command in [post("hello"), allpost("hello")] {
            let mut directory = MockLocations::new();
            directory
                .expect_list_locations()
                .times(1)
                .returning(|_| Ok(Vec::new()));
            directory.expect_post().never();

            let reply = dispatcher(signed_in(), directory).dispatch(command).await;
            assert_eq!(reply, Reply::NoProfiles);
        }
    }

    #[tokio::test]
    async fn test_post_targets_only_first_location() {
        let mut directory = MockLocations::new();
        directory
            .expect_list_locations()
            .returning(|_| Ok(locations(&["A", "B", "C"])));
        directory
            .expect_post()
            .withf(|location, text, _| location.as_str() == "A" && text == "hello world")
            .times(1)
            .returning(|_, _, _| true);

        let reply = dispatcher(signed_in(), directory)
            .dispatch(post("hello world"))
            .await;
        assert_eq!(reply, Reply::Posted);
    }

    #[tokio::test]
    async fn test_post_failure_does_not_fall_back() {
        let mut directory = MockLocations::new();
        directory
            .expect_list_locations()
            .returning(|_| Ok(locations(&["A", "B"])));
        directory
            .expect_post()
            .withf(|location, _, _| location.as_str() == "A")
            .times(1)
            .returning(|_, _, _| false);

        let reply = dispatcher(signed_in(), directory).dispatch(post("hello")).await;
        assert_eq!(reply, Reply::PostFailed);
    }

    #[tokio::test]
    async fn test_allpost_counts_successes_in_order() {
        let mut seq = Sequence::new();
        let mut directory = MockLocations::new();
        directory
            .expect_list_locations()
            .times(1)
            .returning(|_| Ok(locations(&["A", "B", "C"])));
        for (name, succeeds) in [("A", true), ("B", false), ("C", true)] {
            directory
                .expect_post()
                .withf(move |location, text, _| location.as_str() == name && text == "hours")
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, _| succeeds);
        }

        let reply = dispatcher(signed_in(), directory).dispatch(allpost("hours")).await;
        assert_eq!(
            reply,
            Reply::Broadcast {
                posted: 2,
                attempted: 3
            }
        );
        assert!(reply.to_string().contains("2 profile(s)"));
    }

    #[tokio::test]
    async fn test_allpost_all_failing() {
        let mut directory = MockLocations::new();
        directory
            .expect_list_locations()
            .returning(|_| Ok(locations(&["A", "B"])));
        directory
            .expect_post()
            .times(2)
            .returning(|_, _, _| false);

        let reply = dispatcher(signed_in(), directory).dispatch(allpost("x")).await;
        assert_eq!(
            reply,
            Reply::Broadcast {
                posted: 0,
                attempted: 2
            }
        );
    }

    #[tokio::test]
    async fn test_auth_failure_is_generic() {
        let mut sessions = MockSessions::new();
        sessions
            .expect_ensure_valid_session()
            .times(1)
            .returning(|| Err(AuthError::ConsentDenied("access_denied".to_string())));
        let mut directory = MockLocations::new();
        directory.expect_list_locations().never();
        directory.expect_post().never();

        let reply = dispatcher(sessions, directory).dispatch(post("hello")).await;
        assert_eq!(reply, Reply::Failure);
        assert!(!reply.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_listing_failure_is_generic() {
        let mut directory = MockLocations::new();
        directory.expect_list_locations().returning(|_| {
            Err(DirectoryError::ConfigurationError("boom".to_string()))
        });
        directory.expect_post().never();

        let reply = dispatcher(signed_in(), directory).dispatch(allpost("hello")).await;
        assert_eq!(reply, Reply::Failure);
    }

    #[tokio::test]
    async fn test_keeps_serving_after_failure() {
        let mut sessions = MockSessions::new();
        let mut seq = Sequence::new();
        sessions
            .expect_ensure_valid_session()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(AuthError::MissingCode));
        sessions
            .expect_ensure_valid_session()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(credential()));

        let mut directory = MockLocations::new();
        directory
            .expect_list_locations()
            .returning(|_| Ok(locations(&["A"])));
        directory.expect_post().returning(|_, _, _| true);

        let dispatcher = dispatcher(sessions, directory);
        assert_eq!(dispatcher.dispatch(post("one")).await, Reply::Failure);
        assert_eq!(dispatcher.dispatch(post("two")).await, Reply::Posted);
    }
}
