//! Telegram command parsing.

use crate::domain::subscriber::MerchantCredentials;

/// Supported Telegram commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramCommand {
    Start,
    Help,
    Status,
    Setup(MerchantCredentials),
    Notify { enabled: bool },
    Orders { success_only: bool },
    Settlements,
}

/// Parse error for Telegram command messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    NotACommand,
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument { name: &'static str, value: String },
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotACommand => write!(f, "message is not a command"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
            Self::MissingArgument(name) => write!(f, "missing argument `{name}`"),
            Self::InvalidArgument { name, value } => {
                write!(f, "invalid {name} `{value}`")
            }
        }
    }
}

impl std::error::Error for CommandParseError {}

/// Parse a Telegram message into a bot command.
pub fn parse_command(text: &str) -> Result<TelegramCommand, CommandParseError> {
    let mut parts = text.split_whitespace();
    let Some(raw_command) = parts.next() else {
        return Err(CommandParseError::NotACommand);
    };
    if !raw_command.starts_with('/') {
        return Err(CommandParseError::NotACommand);
    }

    let command = raw_command
        .split_once('@')
        .map_or(raw_command, |(head, _)| head);

    match command {
        "/start" => Ok(TelegramCommand::Start),
        "/help" => Ok(TelegramCommand::Help),
        "/status" => Ok(TelegramCommand::Status),
        "/setup" => {
            let domain = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("domain"))?;
            let merchant_id = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("merchant_id"))?;
            let key = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("key"))?;

            Ok(TelegramCommand::Setup(MerchantCredentials::new(
                normalize_domain(domain)?,
                merchant_id,
                key,
            )))
        }
        "/notify" => {
            let raw = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("on|off"))?;
            let enabled = match raw.to_ascii_lowercase().as_str() {
                "on" | "1" | "true" => true,
                "off" | "0" | "false" => false,
                _ => {
                    return Err(CommandParseError::InvalidArgument {
                        name: "switch",
                        value: raw.to_string(),
                    })
                }
            };
            Ok(TelegramCommand::Notify { enabled })
        }
        "/orders" => match parts.next() {
            None => Ok(TelegramCommand::Orders {
                success_only: false,
            }),
            Some("success" | "paid") => Ok(TelegramCommand::Orders { success_only: true }),
            Some(other) => Err(CommandParseError::InvalidArgument {
                name: "filter",
                value: other.to_string(),
            }),
        },
        "/settlements" => Ok(TelegramCommand::Settlements),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

/// Strip a URL scheme and trailing slashes; the rest must look like a host.
fn normalize_domain(raw: &str) -> Result<String, CommandParseError> {
    let domain = raw
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    if !domain.contains('.') || domain.contains('/') {
        return Err(CommandParseError::InvalidArgument {
            name: "domain",
            value: raw.to_string(),
        });
    }
    Ok(domain.to_string())
}

/// Help text returned by `/start` and `/help`.
#[must_use]
pub const fn command_help() -> &'static str {
    "📋 Commands\n\n\
    /setup <domain> <merchant_id> <key> - 🔐 Save gateway credentials\n\
    /notify on|off - 🔔 Switch notifications\n\
    /status - 📊 Credentials and polling state\n\
    /orders [success] - 🧾 Recent orders\n\
    /settlements - 💵 Recent settlements\n\
    /help - 📋 Show this help"
}

/// Bot commands for Telegram menu registration.
///
/// Returns tuples of (command, description) for `set_my_commands`.
#[must_use]
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("setup", "Save gateway credentials"),
        ("notify", "Switch notifications on or off"),
        ("status", "Credentials and polling state"),
        ("orders", "Recent orders"),
        ("settlements", "Recent settlements"),
        ("help", "Show all commands"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("/start"), Ok(TelegramCommand::Start));
        assert_eq!(parse_command("/status@epay_bot"), Ok(TelegramCommand::Status));
        assert_eq!(parse_command("/settlements"), Ok(TelegramCommand::Settlements));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("hello"), Err(CommandParseError::NotACommand));
        assert_eq!(parse_command("   "), Err(CommandParseError::NotACommand));
    }

    #[test]
    fn setup_strips_scheme() {
        let cmd = parse_command("/setup https://pay.example.com/ 1000 abcdef").unwrap();
        assert_eq!(
            cmd,
            TelegramCommand::Setup(MerchantCredentials::new("pay.example.com", "1000", "abcdef"))
        );
    }

    #[test]
    fn setup_rejects_domain_without_dot() {
        assert!(matches!(
            parse_command("/setup localhost 1000 abcdef"),
            Err(CommandParseError::InvalidArgument { name: "domain", .. })
        ));
    }

    #[test]
    fn setup_requires_all_arguments() {
        assert_eq!(
            parse_command("/setup pay.example.com 1000"),
            Err(CommandParseError::MissingArgument("key"))
        );
    }

    #[test]
    fn notify_switch() {
        assert_eq!(
            parse_command("/notify ON"),
            Ok(TelegramCommand::Notify { enabled: true })
        );
        assert_eq!(
            parse_command("/notify off"),
            Ok(TelegramCommand::Notify { enabled: false })
        );
        assert!(parse_command("/notify maybe").is_err());
        assert_eq!(
            parse_command("/notify"),
            Err(CommandParseError::MissingArgument("on|off"))
        );
    }

    #[test]
    fn orders_filter() {
        assert_eq!(
            parse_command("/orders"),
            Ok(TelegramCommand::Orders {
                success_only: false
            })
        );
        assert_eq!(
            parse_command("/orders success"),
            Ok(TelegramCommand::Orders { success_only: true })
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/pause"),
            Err(CommandParseError::UnknownCommand("/pause".into()))
        );
    }

    #[test]
    fn menu_lists_help() {
        assert!(bot_commands().iter().any(|(cmd, _)| *cmd == "help"));
    }
}
