#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Login { username: String, password: String },
    Logout,
    WhoAmI,
    /// `None` asks for the current selection.
    Agency(Option<String>),
    Attach(String),
    Ingest,
    Status,
    Clear,
    Quit,
    Unknown(String),
    /// A known command with missing or extra arguments.
    Invalid { usage: &'static str },
}

pub const LOGIN_USAGE: &str = "/login <username> <password>";
pub const AGENCY_USAGE: &str = "/agency [legal|design]";
pub const ATTACH_USAGE: &str = "/attach <path>";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/login" => match args.as_slice() {
            [username, password] => SlashCommand::Login {
                username: (*username).to_string(),
                password: (*password).to_string(),
            },
            _ => SlashCommand::Invalid { usage: LOGIN_USAGE },
        },
        "/logout" => SlashCommand::Logout,
        "/whoami" => SlashCommand::WhoAmI,
        "/agency" => match args.as_slice() {
            [] => SlashCommand::Agency(None),
            [name] => SlashCommand::Agency(Some((*name).to_string())),
            _ => SlashCommand::Invalid {
                usage: AGENCY_USAGE,
            },
        },
        // Paths may contain spaces.
        "/attach" if !rest.is_empty() => SlashCommand::Attach(rest.to_string()),
        "/attach" => SlashCommand::Invalid {
            usage: ATTACH_USAGE,
        },
        "/ingest" => SlashCommand::Ingest,
        "/status" => SlashCommand::Status,
        "/clear" => SlashCommand::Clear,
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

impl SlashCommand {
    /// Commands accepted before sign-in.
    pub fn allowed_signed_out(&self) -> bool {
        matches!(
            self,
            Self::Help
                | Self::Login { .. }
                | Self::Status
                | Self::Quit
                | Self::Unknown(_)
                | Self::Invalid { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("draft an NDA"), None);
        assert_eq!(parse_slash_command("  "), None);
    }

    #[test]
    fn login_requires_exactly_two_arguments() {
        assert_eq!(
            parse_slash_command("/login ada@example.com s3cret"),
            Some(SlashCommand::Login {
                username: "ada@example.com".to_string(),
                password: "s3cret".to_string(),
            })
        );
        assert_eq!(
            parse_slash_command("/login ada@example.com"),
            Some(SlashCommand::Invalid { usage: LOGIN_USAGE })
        );
    }

    #[test]
    fn attach_keeps_spaces_in_path() {
        assert_eq!(
            parse_slash_command("/attach  ./My Contracts/lease v2.pdf "),
            Some(SlashCommand::Attach("./My Contracts/lease v2.pdf".to_string()))
        );
        assert_eq!(
            parse_slash_command("/attach"),
            Some(SlashCommand::Invalid {
                usage: ATTACH_USAGE
            })
        );
    }

    #[test]
    fn agency_argument_is_optional() {
        assert_eq!(parse_slash_command("/agency"), Some(SlashCommand::Agency(None)));
        assert_eq!(
            parse_slash_command("/agency Design"),
            Some(SlashCommand::Agency(Some("Design".to_string())))
        );
        assert_eq!(
            parse_slash_command("/agency legal design"),
            Some(SlashCommand::Invalid {
                usage: AGENCY_USAGE
            })
        );
    }

    #[test]
    fn unknown_command_keeps_only_its_name() {
        assert_eq!(
            parse_slash_command("/nope extra args"),
            Some(SlashCommand::Unknown("/nope".to_string()))
        );
    }

    #[test]
    fn signed_out_gate() {
        assert!(SlashCommand::Help.allowed_signed_out());
        assert!(SlashCommand::Status.allowed_signed_out());
        assert!(SlashCommand::Quit.allowed_signed_out());
        assert!(!SlashCommand::Logout.allowed_signed_out());
        assert!(!SlashCommand::Agency(None).allowed_signed_out());
        assert!(!SlashCommand::Ingest.allowed_signed_out());
    }
}
