use std::io::{self, IsTerminal};
use std::process::ExitCode;

use automa::retry::LoginConfig;
use automa_login::{Console, Flow, HashedStore, LoginError, flows};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Log filter, same syntax as `RUST_LOG`.
const LOG_ENV: &str = "AUTOMA_LOG";

fn demo_store() -> HashedStore {
    let mut store = HashedStore::new();
    store.insert("alice", "wonderland");
    store.insert("bob", "builder");
    store
}

/// `automa-login [dfa|nfa|literal] [max attempts]`
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(Flow, LoginConfig), LoginError> {
    let flow = match args.next() {
        Some(name) => name.parse()?,
        None => Flow::Dfa,
    };
    let mut config = LoginConfig::default();
    if let Some(attempts) = args.next() {
        config.max_attempts = attempts
            .parse()
            .map_err(|_| LoginError::InvalidAttempts(attempts.clone()))?;
    }
    Ok((flow, config))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let result = parse_args(std::env::args().skip(1)).and_then(|(flow, config)| {
        let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
        let mut console = Console::new(io::stdin().lock(), io::stdout()).hide_secrets(interactive);
        flows::run(flow, &mut console, &demo_store(), config)
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!(%err, "login aborted");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
