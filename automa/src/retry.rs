//! Bounded-retry login protocol: identifier first, then a secret, retried at most `max_attempts` times.
//!
//! The phases are the states of a [`Dfa`] over protocol [`Event`]s. A [`LoginSession`] turns calls into events,
//! feeds them through a [`DfaRunner`], and so every transition attempt gets a step number and an audit record.
//! Retrying is its own phase, separate from the terminal `Failure` and from the DFA's absorbing error state.

use std::collections::HashMap as StdHashMap;
use std::hash::BuildHasher;

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::audit::AuditSink;
use crate::dfa::{Dfa, DfaBuilder, DfaRunner};
use crate::error::{BuildError, ProtocolError};
use crate::graph::StateId;

/// Input alphabet of the protocol DFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The identifier is known to the store.
    KnownIdentifier,
    /// The identifier is not known to the store.
    UnknownIdentifier,
    /// The secret matched.
    SecretAccepted,
    /// The secret did not match and attempts remain.
    SecretRejected,
    /// The secret did not match and that was the last attempt.
    BudgetExhausted,
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the identifier.
    Start,
    /// Identifier accepted, waiting for the first secret.
    AwaitingSecret,
    /// A secret was rejected, waiting for another one.
    Retrying,
    /// Authenticated. Terminal.
    Success,
    /// Unknown identifier or budget exhausted. Terminal.
    Failure,
}

impl Phase {
    /// Returns if no further call is accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Failure)
    }

    fn accepts_secret(self) -> bool {
        matches!(self, Phase::AwaitingSecret | Phase::Retrying)
    }
}

/// Result of one validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The secret matched.
    Success,
    /// Wrong secret, `remaining` more attempts are allowed.
    Retry {
        /// Attempts left.
        remaining: u32,
    },
    /// Wrong secret on the last attempt, or unknown identifier.
    Failure,
}

/// Knobs of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginConfig {
    /// Secret validations allowed before the session fails, at least 1.
    pub max_attempts: u32,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Source of truth for identifiers and secrets. How secrets are stored or hashed is up to the implementation.
pub trait CredentialStore {
    /// Returns if the identifier exists.
    fn knows(&self, identifier: &str) -> bool;
    /// Returns if `secret` is the right one for `identifier`.
    fn verify(&self, identifier: &str, secret: &str) -> bool;
}

impl<S: BuildHasher> CredentialStore for HashMap<String, String, S> {
    fn knows(&self, identifier: &str) -> bool {
        self.contains_key(identifier)
    }

    fn verify(&self, identifier: &str, secret: &str) -> bool {
        self.get(identifier).is_some_and(|expected| expected == secret)
    }
}

impl<S: BuildHasher> CredentialStore for StdHashMap<String, String, S> {
    fn knows(&self, identifier: &str) -> bool {
        self.contains_key(identifier)
    }

    fn verify(&self, identifier: &str, secret: &str) -> bool {
        self.get(identifier).is_some_and(|expected| expected == secret)
    }
}

impl<C: CredentialStore + ?Sized> CredentialStore for &C {
    fn knows(&self, identifier: &str) -> bool {
        (**self).knows(identifier)
    }

    fn verify(&self, identifier: &str, secret: &str) -> bool {
        (**self).verify(identifier, secret)
    }
}

// MARK: Machine
/// The protocol DFA together with its retry budget. Build once, open any number of sessions.
#[derive(Debug, Clone)]
pub struct LoginMachine {
    dfa: Dfa<Event>,
    start: StateId,
    awaiting: StateId,
    retrying: StateId,
    success: StateId,
    failure: StateId,
    max_attempts: u32,
}

impl LoginMachine {
    /// Builds the protocol DFA. Fails on a zero retry budget.
    pub fn new(config: LoginConfig) -> Result<Self, BuildError> {
        if config.max_attempts == 0 {
            return Err(BuildError::InvalidRetryBudget);
        }

        let mut builder = DfaBuilder::new();
        let start = builder.add_state("start");
        let awaiting = builder.add_state("awaiting_secret");
        let retrying = builder.add_state("retrying");
        let success = builder.add_accept_state("success");
        let failure = builder.add_state("failure");

        builder.add_transition(start, Event::KnownIdentifier, awaiting)?;
        builder.add_transition(start, Event::UnknownIdentifier, failure)?;
        for waiting in [awaiting, retrying] {
            builder.add_transition(waiting, Event::SecretAccepted, success)?;
            builder.add_transition(waiting, Event::SecretRejected, retrying)?;
            builder.add_transition(waiting, Event::BudgetExhausted, failure)?;
        }
        builder.set_start(start)?;

        Ok(Self {
            dfa: builder.build()?,
            start,
            awaiting,
            retrying,
            success,
            failure,
            max_attempts: config.max_attempts,
        })
    }

    /// The underlying DFA.
    pub fn dfa(&self) -> &Dfa<Event> {
        &self.dfa
    }

    /// Secret validations allowed per session.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Phase a DFA state stands for. The error state is unreachable through a session and reads as `Failure`.
    pub fn phase_of(&self, state: StateId) -> Phase {
        match state {
            s if s == self.start => Phase::Start,
            s if s == self.awaiting => Phase::AwaitingSecret,
            s if s == self.retrying => Phase::Retrying,
            s if s == self.success => Phase::Success,
            _ => Phase::Failure,
        }
    }

    /// Opens a session without auditing.
    pub fn session<C: CredentialStore>(&self, store: C) -> LoginSession<'_, C> {
        self.session_with_sink(store, ())
    }

    /// Opens a session reporting every transition attempt to `sink`.
    pub fn session_with_sink<C: CredentialStore, S: AuditSink<Event>>(&self, store: C, sink: S) -> LoginSession<'_, C, S> {
        LoginSession {
            machine: self,
            runner: DfaRunner::with_sink(&self.dfa, sink),
            store,
            identifier: None,
            secret: None,
            attempts: 0,
        }
    }
}

// MARK: Session
/// One pass through the protocol.
pub struct LoginSession<'m, C: CredentialStore, S: AuditSink<Event> = ()> {
    machine: &'m LoginMachine,
    runner: DfaRunner<'m, Event, S>,
    store: C,
    identifier: Option<String>,
    secret: Option<String>,
    attempts: u32,
}

impl<C: CredentialStore, S: AuditSink<Event>> LoginSession<'_, C, S> {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.machine.phase_of(self.runner.current())
    }

    /// Transition attempts so far, identifier step included.
    pub fn steps(&self) -> usize {
        self.runner.cursor()
    }

    /// Secret validations so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Secret validations still allowed.
    pub fn remaining(&self) -> u32 {
        self.machine.max_attempts - self.attempts
    }

    /// The identifier, once one was submitted.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Takes the identifier and moves to `AwaitingSecret`, or straight to `Failure` if it is unknown.
    /// Counts as one step.
    pub fn submit_identifier(&mut self, identifier: &str) -> Result<Phase, ProtocolError> {
        self.require(Phase::Start == self.phase(), "submit an identifier")?;

        let event = if self.store.knows(identifier) {
            Event::KnownIdentifier
        } else {
            Event::UnknownIdentifier
        };
        self.runner.step(event)?;
        self.identifier = Some(identifier.to_owned());

        let phase = self.phase();
        if phase == Phase::Failure {
            warn!(identifier, "unknown identifier");
        } else {
            debug!(identifier, step = self.steps(), "identifier accepted");
        }
        Ok(phase)
    }

    /// Collects a secret for the next validation, replacing one collected earlier. Not a transition.
    pub fn submit_secret(&mut self, secret: &str) -> Result<(), ProtocolError> {
        self.require(self.phase().accepts_secret(), "submit a secret")?;
        self.secret = Some(secret.to_owned());
        Ok(())
    }

    /// Checks the collected secret. Counts as one step. Once the budget is spent the session fails,
    /// whatever the store would say about later attempts.
    pub fn validate(&mut self) -> Result<Outcome, ProtocolError> {
        self.require(self.phase().accepts_secret(), "validate")?;
        let secret = self.secret.take().ok_or(ProtocolError::MissingSecret)?;
        let identifier = self.identifier.as_deref().unwrap_or_default();

        self.attempts += 1;
        let event = if self.store.verify(identifier, &secret) {
            Event::SecretAccepted
        } else if self.attempts >= self.machine.max_attempts {
            Event::BudgetExhausted
        } else {
            Event::SecretRejected
        };
        self.runner.step(event)?;

        let outcome = match self.phase() {
            Phase::Success => Outcome::Success,
            Phase::Retrying => Outcome::Retry {
                remaining: self.remaining(),
            },
            _ => Outcome::Failure,
        };
        debug!(attempt = self.attempts, step = self.steps(), ?outcome, "validated secret");
        Ok(outcome)
    }

    /// [`submit_secret`](Self::submit_secret) then [`validate`](Self::validate).
    pub fn attempt(&mut self, secret: &str) -> Result<Outcome, ProtocolError> {
        self.submit_secret(secret)?;
        self.validate()
    }

    /// The attached sink.
    pub fn sink(&self) -> &S {
        self.runner.sink()
    }

    /// Ends the session, returning its sink.
    pub fn into_sink(self) -> S {
        self.runner.into_sink()
    }

    fn require(&self, allowed: bool, operation: &'static str) -> Result<(), ProtocolError> {
        if allowed {
            Ok(())
        } else {
            Err(ProtocolError::OutOfOrder {
                phase: self.phase(),
                operation,
            })
        }
    }
}

// MARK: Tests
#[cfg(test)]
mod test {
    use super::*;
    use crate::audit::StepRecord;

    fn alice() -> HashMap<String, String> {
        HashMap::from_iter([("alice".to_owned(), "secret".to_owned())])
    }

    #[test]
    fn test_three_wrong_secrets_fail() {
        let machine = LoginMachine::new(LoginConfig { max_attempts: 3 }).unwrap();
        let mut session = machine.session(alice());

        assert_eq!(session.submit_identifier("alice"), Ok(Phase::AwaitingSecret));
        assert_eq!(session.attempt("nope"), Ok(Outcome::Retry { remaining: 2 }));
        assert_eq!(session.phase(), Phase::Retrying);
        assert_eq!(session.attempt("still no"), Ok(Outcome::Retry { remaining: 1 }));
        assert_eq!(session.attempt("wrong"), Ok(Outcome::Failure));
        assert_eq!(session.phase(), Phase::Failure);
        assert_eq!(session.steps(), 4);
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_success_on_second_attempt() {
        let machine = LoginMachine::new(LoginConfig { max_attempts: 3 }).unwrap();
        let mut session = machine.session(alice());

        session.submit_identifier("alice").unwrap();
        assert_eq!(session.attempt("guess"), Ok(Outcome::Retry { remaining: 2 }));
        assert_eq!(session.attempt("secret"), Ok(Outcome::Success));
        assert_eq!(session.phase(), Phase::Success);
        assert_eq!(session.attempts(), 2);
        // identifier step plus two validations
        assert_eq!(session.steps(), 3);
    }

    #[test]
    fn test_budget_is_a_hard_ceiling() {
        let machine = LoginMachine::new(LoginConfig { max_attempts: 1 }).unwrap();
        let mut session = machine.session(alice());
        session.submit_identifier("alice").unwrap();
        assert_eq!(session.attempt("wrong"), Ok(Outcome::Failure));
        // the right secret is no longer even looked at
        assert_eq!(
            session.attempt("secret"),
            Err(ProtocolError::OutOfOrder {
                phase: Phase::Failure,
                operation: "submit a secret",
            })
        );
        assert_eq!(session.steps(), 2);
    }

    #[test]
    fn test_unknown_identifier() {
        let machine = LoginMachine::new(LoginConfig::default()).unwrap();
        let mut session = machine.session(alice());
        assert_eq!(session.submit_identifier("mallory"), Ok(Phase::Failure));
        assert_eq!(session.steps(), 1);
        assert!(session.phase().is_terminal());
        assert!(session.submit_secret("secret").is_err());
    }

    #[test]
    fn test_out_of_order_calls() {
        let machine = LoginMachine::new(LoginConfig::default()).unwrap();
        let mut session = machine.session(alice());

        assert_eq!(
            session.submit_secret("secret"),
            Err(ProtocolError::OutOfOrder {
                phase: Phase::Start,
                operation: "submit a secret",
            })
        );
        assert_eq!(
            session.validate(),
            Err(ProtocolError::OutOfOrder {
                phase: Phase::Start,
                operation: "validate",
            })
        );
        session.submit_identifier("alice").unwrap();
        assert_eq!(session.validate(), Err(ProtocolError::MissingSecret));
        assert!(matches!(
            session.submit_identifier("alice"),
            Err(ProtocolError::OutOfOrder { phase: Phase::AwaitingSecret, .. })
        ));
        // refused calls are not steps
        assert_eq!(session.steps(), 1);
        assert_eq!(session.attempts(), 0);

        assert_eq!(session.attempt("secret"), Ok(Outcome::Success));
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_later_secret_replaces_earlier() {
        let machine = LoginMachine::new(LoginConfig::default()).unwrap();
        let mut session = machine.session(alice());
        session.submit_identifier("alice").unwrap();
        session.submit_secret("typo").unwrap();
        session.submit_secret("secret").unwrap();
        assert_eq!(session.validate(), Ok(Outcome::Success));
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(
            LoginMachine::new(LoginConfig { max_attempts: 0 }).unwrap_err(),
            BuildError::InvalidRetryBudget
        );
    }

    #[test]
    fn test_every_step_is_audited() {
        let machine = LoginMachine::new(LoginConfig::default()).unwrap();
        let store = alice();
        let mut session = machine.session_with_sink(&store, Vec::<StepRecord<Event>>::new());
        session.submit_identifier("alice").unwrap();
        session.attempt("one").unwrap();
        session.attempt("two").unwrap();
        session.attempt("secret").unwrap();
        let records = session.into_sink();

        let events: Vec<Event> = records.iter().map(|r| r.symbol).collect();
        assert_eq!(
            events,
            vec![
                Event::KnownIdentifier,
                Event::SecretRejected,
                Event::SecretRejected,
                Event::SecretAccepted,
            ]
        );
        assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(records.iter().all(|r| r.before.len() == 1 && r.after.len() == 1));
        let last = records.last().unwrap().after.iter().next().unwrap();
        assert_eq!(machine.phase_of(last), Phase::Success);
    }

    #[test]
    fn test_retrying_is_not_the_error_state() {
        let machine = LoginMachine::new(LoginConfig::default()).unwrap();
        let dfa = machine.dfa();
        let start = dfa.start();
        let awaiting = dfa.step(start, &Event::KnownIdentifier);
        let retrying = dfa.step(awaiting, &Event::SecretRejected);
        assert_eq!(machine.phase_of(retrying), Phase::Retrying);
        assert!(!dfa.is_error(retrying));
        assert_ne!(retrying, dfa.step(retrying, &Event::BudgetExhausted));
        // out of the protocol
        assert!(dfa.is_error(dfa.step(start, &Event::SecretAccepted)));
    }

    #[test]
    fn test_std_map_store() {
        let store: StdHashMap<String, String> = [("bob".to_owned(), "builder".to_owned())].into();
        assert!(store.knows("bob"));
        assert!(store.verify("bob", "builder"));
        assert!(!store.verify("bob", "wonderland"));
        assert!(!store.verify("carol", "builder"));
    }
}
