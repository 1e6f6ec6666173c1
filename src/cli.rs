use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sudo-askpass",
    about = "Supply the sudo password from CI variables, the session, the keychain, or a prompt.",
    long_about = "Supply the sudo password from CI variables, the session, the keychain, or a prompt.\n\n\
                  Point sudo at this program with `export SUDO_ASKPASS=$(command -v sudo-askpass)` \
                  and run `sudo -A ...`.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Prompt text passed by sudo. Accepted and ignored.
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive wizard to choose and persist a password source.
    Setup,

    /// Resolve the password once and report where it came from (never prints it).
    Test,

    /// Show which password sources are configured, in priority order.
    Config,

    /// Save the password in the OS secure store (value is prompted interactively).
    Store {
        /// Read the password from one line of standard input instead of the terminal.
        #[arg(long)]
        stdin: bool,
    },

    /// Remove the stored password from the OS secure store.
    Remove,

    /// Print version information.
    Version,
}

impl Cli {
    /// Parse the process arguments.
    ///
    /// sudo invokes an askpass helper with its prompt text as the only
    /// argument, so a lone positional that is not a subcommand must be
    /// accepted and ignored. Bare command-like words are still rejected as
    /// unknown subcommands so typos do not silently run the resolver.
    ///
    /// Custom prompts (`sudo -p`) must therefore not be a single lowercase
    /// word: `password` exits with a usage error, and a prompt equal to a
    /// subcommand name such as `test` or `help` runs that subcommand instead.
    /// sudo's own prompts always contain a space or a colon.
    pub fn parse_invocation() -> Self {
        let cli = Self::parse();
        if let Some(prompt) = &cli.prompt {
            if looks_like_command(prompt) {
                Self::command()
                    .error(
                        ErrorKind::InvalidSubcommand,
                        format!("unrecognized subcommand '{}'", prompt),
                    )
                    .exit();
            }
        }
        cli
    }
}

/// A lowercase ASCII word such as `stroe`, as opposed to prompt text like
/// `[sudo] password for alice: `.
pub fn looks_like_command(arg: &str) -> bool {
    let mut chars = arg.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sudo-askpass").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_arguments_is_default() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.prompt.is_none());
    }

    #[test]
    fn test_sudo_prompt_is_accepted() {
        for prompt in ["Password:", "[sudo] password for alice: ", "Password for sudo"] {
            let cli = parse(&[prompt]).unwrap();
            assert!(cli.command.is_none(), "{prompt}");
            assert_eq!(cli.prompt.as_deref(), Some(prompt));
            assert!(!looks_like_command(prompt), "{prompt}");
        }
    }

    #[test]
    fn test_single_word_prompts_are_not_prompt_text() {
        assert!(looks_like_command("password"));
        assert!(matches!(parse(&["test"]).unwrap().command, Some(Command::Test)));
        assert!(!looks_like_command("password:"));
        assert!(!looks_like_command("Password"));
    }

    #[test]
    fn test_subcommands_parse() {
        assert!(matches!(parse(&["setup"]).unwrap().command, Some(Command::Setup)));
        assert!(matches!(parse(&["test"]).unwrap().command, Some(Command::Test)));
        assert!(matches!(parse(&["config"]).unwrap().command, Some(Command::Config)));
        assert!(matches!(
            parse(&["store"]).unwrap().command,
            Some(Command::Store { stdin: false })
        ));
        assert!(matches!(
            parse(&["store", "--stdin"]).unwrap().command,
            Some(Command::Store { stdin: true })
        ));
        assert!(matches!(parse(&["remove"]).unwrap().command, Some(Command::Remove)));
        assert!(matches!(parse(&["version"]).unwrap().command, Some(Command::Version)));
    }

    #[test]
    fn test_command_like_words_are_flagged() {
        assert!(looks_like_command("stroe"));
        assert!(looks_like_command("frobnicate-2"));
        assert!(!looks_like_command(""));
        assert!(!looks_like_command("Password:"));
        assert!(!looks_like_command("enter password"));
    }

    #[test]
    fn test_two_positionals_rejected() {
        assert!(parse(&["Password:", "extra"]).is_err());
    }

    #[test]
    fn test_help_subcommand_is_available() {
        let err = parse(&["help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
