/// A chat command addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// `/track` with its first argument, if any.
    Track(Option<String>),
    Watching,
    Stop,
}

impl Command {
    /// Parses a message text. Returns `None` for anything that is not one of
    /// the bot's commands, including commands addressed to other bots.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = match head.split_once('@') {
            Some((name, target)) => {
                if let Some(username) = bot_username {
                    if !target.eq_ignore_ascii_case(username) {
                        return None;
                    }
                }
                name
            }
            None => head,
        };

        match name {
            "start" => Some(Command::Start),
            "track" => Some(Command::Track(parts.next().map(str::to_string))),
            "watching" => Some(Command::Watching),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

/// An inline-choice action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `replace_<slot>`; the selector is validated by the engine.
    Replace(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        data.strip_prefix("replace_")
            .map(|selector| CallbackAction::Replace(selector.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/watching", None), Some(Command::Watching));
        assert_eq!(Command::parse("/stop", None), Some(Command::Stop));
        assert_eq!(Command::parse("/track", None), Some(Command::Track(None)));
        assert_eq!(
            Command::parse("/track  ABC extra", None),
            Some(Command::Track(Some("ABC".into())))
        );
    }

    #[test]
    fn test_ignores_plain_text_and_unknown_commands() {
        assert_eq!(Command::parse("hello", None), None);
        assert_eq!(Command::parse("/help", None), None);
        assert_eq!(Command::parse("", None), None);
    }

    #[test]
    fn test_bot_mentions() {
        assert_eq!(
            Command::parse("/watching@DexWatchBot", Some("dexwatchbot")),
            Some(Command::Watching)
        );
        assert_eq!(Command::parse("/watching@OtherBot", Some("dexwatchbot")), None);
        assert_eq!(
            Command::parse("/stop@AnyBot", None),
            Some(Command::Stop)
        );
    }

    #[test]
    fn test_parse_callback() {
        assert_eq!(
            CallbackAction::parse("replace_2"),
            Some(CallbackAction::Replace("2".into()))
        );
        assert_eq!(
            CallbackAction::parse("replace_x"),
            Some(CallbackAction::Replace("x".into()))
        );
        assert_eq!(CallbackAction::parse("settings"), None);
    }
}
