// Command-line arguments. Exit codes differ from clap's defaults (help and
// usage errors exit 1, version exits 0), so parsing goes through
// `Args::from_argv` which hands the decision back to `main`.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};

const EXAMPLES: &str = "\
Authentication is done by generating the appropriate header after reading the
line 'authentication <username> <api key>' from ~/.cxrc (or $CXRC).

Examples:
  Absolute path:
    $ cx https://api.cxense.com/public/date

  Relative path, resolved against https://api.cxense.com unless an
  'apiserver <url>' line is present in ~/.cxrc:
    $ cx /public/date

  POST request with a request object:
    $ cx /site '{\"siteId\":\"9222300742735526873\"}'

  POST request reading the request object from stdin:
    $ echo '{\"siteId\":\"9222300742735526873\"}' | cx /site -

  GET request with json parameter:
    $ cx '/profile/content/fetch?json=%7B%22url%22%3A%22http%3A%2F%2Fwww.example.com%22%7D'";

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "cx",
    version,
    about = "Execute signed cXense API requests",
    after_help = EXAMPLES,
    disable_version_flag = true
)]
pub struct Args {
    /// API path (e.g. /public/date) or full URL
    pub target: String,

    /// Request object as JSON, or "-" to read it from stdin. Omit for GET.
    #[arg(allow_hyphen_values = true)]
    pub body: Option<String>,

    /// Request timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Escape non-ASCII characters in JSON output
    #[arg(long)]
    pub ascii: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Result of parsing the command line.
#[derive(Debug)]
pub enum Parsed {
    Run(Args),
    /// Help, version or a usage error: print `message`, exit with `code`.
    Exit { message: String, code: i32 },
}

impl Args {
    pub fn from_argv<I, T>(argv: I) -> Parsed
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Args::try_parse_from(argv) {
            Ok(args) => Parsed::Run(args),
            Err(err) => match err.kind() {
                ErrorKind::DisplayVersion => Parsed::Exit {
                    message: err.render().to_string(),
                    code: 0,
                },
                ErrorKind::UnknownArgument if is_extra_positional(&err) => Parsed::Exit {
                    message: format!(
                        "Too many arguments. Remember to quote the JSON.\n\n{}",
                        err.render()
                    ),
                    code: 1,
                },
                _ => Parsed::Exit {
                    message: err.render().to_string(),
                    code: 1,
                },
            },
        }
    }
}

// An unexpected bare word usually means an unquoted JSON body.
fn is_extra_positional(err: &clap::Error) -> bool {
    matches!(
        err.get(ContextKind::InvalidArg),
        Some(ContextValue::String(arg)) if !arg.starts_with('-')
    )
}
