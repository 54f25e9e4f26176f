use strum::IntoEnumIterator;
use strum_macros::AsRefStr;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

/// Commands that can be invoked by starting a line with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    // Enum order is the order shown by /help.
    History,
    Help,
    Quit,
}

impl SlashCommand {
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::History => "show the conversation so far",
            SlashCommand::Help => "list available commands",
            SlashCommand::Quit => "exit the chat",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Blank,
    Question(String),
    Command(SlashCommand),
    UnknownCommand(String),
}

/// Classify one line typed at the prompt.
pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Blank;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatInput::Question(trimmed.to_string());
    };
    let name = rest.split_whitespace().next().unwrap_or_default();
    match name.parse::<SlashCommand>() {
        Ok(cmd) => ChatInput::Command(cmd),
        Err(_) => ChatInput::UnknownCommand(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands_and_questions() {
        assert_eq!(parse_input("   "), ChatInput::Blank);
        assert_eq!(parse_input("/quit"), ChatInput::Command(SlashCommand::Quit));
        assert_eq!(
            parse_input("  /history extra"),
            ChatInput::Command(SlashCommand::History)
        );
        assert_eq!(
            parse_input(" What is terrain? "),
            ChatInput::Question("What is terrain?".to_string())
        );
        assert_eq!(
            parse_input("/clear"),
            ChatInput::UnknownCommand("clear".to_string())
        );
    }

    #[test]
    fn every_command_has_a_description() {
        let names: Vec<&str> = built_in_slash_commands().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["history", "help", "quit"]);
        for (_, cmd) in built_in_slash_commands() {
            assert!(!cmd.description().is_empty());
        }
    }
}
