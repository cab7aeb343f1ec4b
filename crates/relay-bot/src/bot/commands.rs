//! Command parsing for chat messages

/// Parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show usage
    Start,
    /// Post to the first location
    Post { text: String },
    /// Post to every location
    AllPost { text: String },
}

impl Command {
    /// Parse a chat message
    ///
    /// Returns `None` for anything that is not one of our commands, including
    /// commands addressed to another bot via `/cmd@otherbot`. The argument
    /// is the remaining words joined by single spaces; it may be empty.
    pub fn parse(input: &str, bot_username: Option<&str>) -> Option<Self> {
        let input = input.trim_start();
        let rest = input.strip_prefix('/')?;

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args),
            None => (rest, ""),
        };

        let name = match head.split_once('@') {
            Some((name, target)) => {
                let addressed_elsewhere =
                    bot_username.is_some_and(|me| !target.eq_ignore_ascii_case(me));
                if addressed_elsewhere {
                    return None;
                }
                name
            }
            None => head,
        };

        let text = args.split_whitespace().collect::<Vec<_>>().join(" ");

        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "post" => Some(Command::Post { text }),
            "allpost" => Some(Command::AllPost { text }),
            _ => None,
        }
    }

    /// Command name without the slash
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Post { .. } => "post",
            Command::AllPost { .. } => "allpost",
        }
    }
}

/// Commands registered in the chat menu, with their descriptions
pub const MENU: &[(&str, &str)] = &[
    ("start", "Show usage"),
    ("post", "Post to the first business profile"),
    ("allpost", "Post to all business profiles"),
];
