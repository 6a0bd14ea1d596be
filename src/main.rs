// Entrypoint for the CLI application.
// - Parse arguments, load config, then hand off to `app::run`.
// - Every failure maps to a documented exit code; see `error::CliError`.

use cx_cli::app::{self, Invocation};
use cx_cli::cli::{Args, Parsed};
use cx_cli::config::Config;
use cx_cli::error::CliError;
use cx_cli::ui::OutputCaps;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CX_LOG=debug`.
const LOG_ENV: &str = "CX_LOG";

fn main() -> ExitCode {
    init_logging();

    let args = match Args::from_argv(std::env::args_os()) {
        Parsed::Run(args) => args,
        Parsed::Exit { message, code } => {
            if code == 0 {
                print!("{message}");
            } else {
                eprint!("{message}");
            }
            return exit(code);
        }
    };

    match run(&args) {
        Ok(status) => exit(app::status_exit_code(status)),
        Err(err) => {
            eprintln!("{err}");
            exit(err.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<u16, CliError> {
    // Credentials are checked here, before anything touches the network.
    let config = Config::load()?.with_timeout_secs(args.timeout);
    let caps = if args.ascii {
        OutputCaps { utf8: false }
    } else {
        OutputCaps::detect()
    };
    let invocation = Invocation {
        target: &args.target,
        body: args.body.as_deref(),
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run(&invocation, &config, std::io::stdin().lock(), &mut out, caps)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
