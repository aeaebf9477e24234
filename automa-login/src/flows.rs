//! The interactive flows, each one a console conversation around one automaton.

use std::io::{BufRead, Write};
use std::str::FromStr;

use automa::retry::{CredentialStore, LoginConfig, LoginMachine, Outcome, Phase};
use automa::{AuditSink, FnSink, Progress, Runner, StateGraph, StepRecord, TracingSink, Verdict};
use tracing::{debug, info};

use crate::console::Console;
use crate::error::LoginError;
use crate::literal::literal;
use crate::symbolic::{classify, login_nfa};

/// Which automaton decides the login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Bounded-retry protocol DFA.
    Dfa,
    /// Four symbol NFA over the classified credentials.
    Nfa,
    /// Literal matchers for a fixed identifier and secret.
    Literal,
}

impl FromStr for Flow {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dfa" => Ok(Flow::Dfa),
            "nfa" => Ok(Flow::Nfa),
            "literal" => Ok(Flow::Literal),
            other => Err(LoginError::UnknownFlow(other.to_owned())),
        }
    }
}

/// Identifier and secret the literal flow accepts.
pub const LITERAL_IDENTIFIER: &str = "admin";
/// See [`LITERAL_IDENTIFIER`].
pub const LITERAL_SECRET: &str = "secret";

/// Runs `flow` to completion, returns if the login succeeded.
pub fn run<C, R, W>(flow: Flow, console: &mut Console<R, W>, store: &C, config: LoginConfig) -> Result<bool, LoginError>
where
    C: CredentialStore,
    R: BufRead,
    W: Write,
{
    info!(?flow, "login start");
    let authenticated = match flow {
        Flow::Dfa => dfa_flow(console, store, config)?,
        Flow::Nfa => nfa_flow(console, store)?,
        Flow::Literal => literal_flow(console, LITERAL_IDENTIFIER, LITERAL_SECRET)?,
    };
    info!(?flow, authenticated, "login finished");
    Ok(authenticated)
}

/// Identifier once, then secrets until success or until the budget runs out.
pub fn dfa_flow<C, R, W>(console: &mut Console<R, W>, store: &C, config: LoginConfig) -> Result<bool, LoginError>
where
    C: CredentialStore,
    R: BufRead,
    W: Write,
{
    let machine = LoginMachine::new(config)?;
    let mut session = machine.session_with_sink(store, TracingSink::new("login-dfa"));

    let identifier = console.prompt("Username")?;
    if session.submit_identifier(&identifier)? == Phase::Failure {
        console.say("Unknown user.")?;
        return Ok(false);
    }

    loop {
        let secret = console.prompt_secret("Password")?;
        match session.attempt(&secret)? {
            Outcome::Success => {
                console.say(&format!("Logged in. Welcome, {identifier}!"))?;
                return Ok(true);
            }
            Outcome::Retry { remaining } => {
                console.say(&format!("Wrong password, {remaining} attempt(s) left."))?;
            }
            Outcome::Failure => {
                console.say("Too many attempts. Access denied.")?;
                return Ok(false);
            }
        }
    }
}

/// Both credentials up front, classified, then one run of the symbolic NFA.
pub fn nfa_flow<C, R, W>(console: &mut Console<R, W>, store: &C) -> Result<bool, LoginError>
where
    C: CredentialStore,
    R: BufRead,
    W: Write,
{
    let graph = login_nfa()?;
    let identifier = console.prompt("Username")?;
    let secret = console.prompt_secret("Password")?;

    let symbols = classify(store, &identifier, &secret);
    let codes: String = symbols.iter().map(|s| s.code()).collect();
    info!(%codes, "classified credentials");

    let mut runner = Runner::with_sink(&graph, TracingSink::new("login-nfa"));
    let verdict = runner.run(symbols)?;
    if verdict.is_accepted() {
        console.say("Login succeeded. Welcome!")?;
    } else {
        console.say("Login failed.")?;
    }
    Ok(verdict.is_accepted())
}

/// Both answers are read before either is judged, so a failure does not tell which one was wrong. Each answer is
/// then fed to its literal matcher one character at a time, the matcher stops listening as soon as every branch
/// died.
pub fn literal_flow<R, W>(console: &mut Console<R, W>, identifier: &str, secret: &str) -> Result<bool, LoginError>
where
    R: BufRead,
    W: Write,
{
    let user_graph = literal(identifier)?;
    let secret_graph = literal(secret)?;

    let user_answer = console.prompt("Username")?;
    let secret_answer = console.prompt_secret("Password")?;

    // only step numbers for the password, its characters stay out of the log
    let redacted = FnSink(|record: &StepRecord<char>| debug!(step = record.index, "password transition"));
    let user_ok = matches_literal(&user_graph, &user_answer, TracingSink::new("username"))?;
    let secret_ok = matches_literal(&secret_graph, &secret_answer, redacted)?;
    if !(user_ok && secret_ok) {
        console.say("Login failed.")?;
        return Ok(false);
    }

    console.say("Login succeeded.")?;
    Ok(true)
}

fn matches_literal<S: AuditSink<char>>(graph: &StateGraph<char>, answer: &str, sink: S) -> Result<bool, LoginError> {
    let mut runner = Runner::with_sink(graph, sink);
    for progress in runner.steps(answer.chars()) {
        let Progress { active, .. } = progress?;
        if active == 0 {
            // nothing left to match, the rest of the answer cannot change the verdict
            return Ok(false);
        }
    }
    Ok(runner.finish()? == Verdict::Accepted)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::store::{HashedStore, digest};

    fn store() -> HashedStore {
        [("alice", digest("wonderland")), ("bob", digest("builder"))].into_iter().collect()
    }

    fn conversation(flow: Flow, typed: &str) -> (Result<bool, LoginError>, String) {
        let mut console = Console::new(Cursor::new(typed.to_owned()), Vec::new());
        let result = run(flow, &mut console, &store(), LoginConfig::default());
        (result, String::from_utf8(console.into_output()).unwrap())
    }

    #[test]
    fn test_flow_names() {
        assert_eq!("dfa".parse::<Flow>().unwrap(), Flow::Dfa);
        assert_eq!("nfa".parse::<Flow>().unwrap(), Flow::Nfa);
        assert_eq!("literal".parse::<Flow>().unwrap(), Flow::Literal);
        assert!(matches!("regex".parse::<Flow>(), Err(LoginError::UnknownFlow(name)) if name == "regex"));
    }

    #[test]
    fn test_dfa_flow_retry_then_success() {
        let (result, printed) = conversation(Flow::Dfa, "alice\nwrong\nwonderland\n");
        assert!(result.unwrap());
        assert!(printed.contains("2 attempt(s) left"));
        assert!(printed.ends_with("Logged in. Welcome, alice!\n"));
    }

    #[test]
    fn test_dfa_flow_exhausted() {
        let (result, printed) = conversation(Flow::Dfa, "bob\na\nb\nc\nbuilder\n");
        assert!(!result.unwrap());
        assert!(printed.contains("Too many attempts"));
        assert_eq!(printed.matches("Password: ").count(), 3);
    }

    #[test]
    fn test_dfa_flow_unknown_user() {
        let (result, printed) = conversation(Flow::Dfa, "mallory\n");
        assert!(!result.unwrap());
        assert!(printed.contains("Unknown user."));
        assert!(!printed.contains("Password"));
    }

    #[test]
    fn test_dfa_flow_input_closed() {
        let (result, _) = conversation(Flow::Dfa, "alice\nwrong\n");
        assert!(matches!(result, Err(LoginError::InputClosed("Password"))));
    }

    #[test]
    fn test_nfa_flow() {
        let (result, printed) = conversation(Flow::Nfa, "bob\nbuilder\n");
        assert!(result.unwrap());
        assert!(printed.contains("Login succeeded"));

        let (result, printed) = conversation(Flow::Nfa, "bob\nwonderland\n");
        assert!(!result.unwrap());
        assert!(printed.contains("Login failed."));
    }

    #[test]
    fn test_literal_flow() {
        let (result, _) = conversation(Flow::Literal, "admin\nsecret\n");
        assert!(result.unwrap());

        let (result, printed) = conversation(Flow::Literal, "admin\nsecre\n");
        assert!(!result.unwrap());
        assert!(printed.ends_with("Login failed.\n"));
    }

    #[test]
    fn test_literal_flow_does_not_reveal_username() {
        let (wrong_user, printed_user) = conversation(Flow::Literal, "adminx\nsecret\n");
        let (wrong_secret, printed_secret) = conversation(Flow::Literal, "admin\nsecre\n");
        assert!(!wrong_user.unwrap());
        assert!(!wrong_secret.unwrap());
        // the password is asked for either way, and the outcome reads the same
        assert!(printed_user.contains("Password: "));
        assert_eq!(printed_user, printed_secret);
    }

    #[test]
    fn test_literal_stops_on_dead_branch() {
        let graph = literal("admin").unwrap();
        let mut records: Vec<StepRecord<char>> = Vec::new();
        assert!(!matches_literal(&graph, "xadmin", &mut records).unwrap());
        assert_eq!(records.len(), 1);
        assert!(matches_literal(&graph, "admin", ()).unwrap());
        assert!(!matches_literal(&graph, "", ()).unwrap());
    }
}
