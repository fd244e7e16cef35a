// Command-line interface definitions and parsing for urlchecker

use clap::Parser;
use clap::error::ErrorKind;

/// Probe catalog URLs read from standard input and mail failure reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (key=value lines)
    #[arg(value_name = "CONFIG")]
    pub config: String,

    // Output & Verbosity
    /// Only log errors
    #[arg(short = 'q', long, help_heading = "Output & Verbosity")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, help_heading = "Output & Verbosity")]
    pub verbose: bool,
}

/// Parse arguments; `Err` carries the exit code after clap has printed its
/// message. Help and version exit 0, usage errors exit 1.
pub fn parse_args<I, T>(args: I) -> Result<Cli, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn test_cli__config_positional() {
        let cli = Cli::try_parse_from(["urlchecker", "checker.conf"]).unwrap();
        assert_eq!(cli.config, "checker.conf");
        assert!(!cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli__verbosity_flags() {
        let cli = Cli::try_parse_from(["urlchecker", "-v", "checker.conf"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["urlchecker", "--quiet", "checker.conf"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli__missing_config_is_an_error() {
        let err = Cli::try_parse_from(["urlchecker"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_args__exit_codes() {
        assert_eq!(parse_args(["urlchecker"]).unwrap_err(), 1);
        assert_eq!(parse_args(["urlchecker", "--help"]).unwrap_err(), 0);
        assert_eq!(parse_args(["urlchecker", "--version"]).unwrap_err(), 0);
        assert!(parse_args(["urlchecker", "a.conf"]).is_ok());
    }

    #[test]
    fn test_cli__debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
