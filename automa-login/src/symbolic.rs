//! The login as a four symbol NFA: each credential is first classified as right or wrong, and the automaton
//! only ever sees the classification.

use automa::retry::CredentialStore;
use automa::{BuildError, StateGraph};

/// Classification of one credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginSymbol {
    /// `u`, known identifier.
    ValidUser,
    /// `x`, unknown identifier.
    InvalidUser,
    /// `p`, right secret.
    ValidSecret,
    /// `y`, wrong secret.
    InvalidSecret,
}

impl LoginSymbol {
    /// Every symbol, in `u x p y` order.
    pub const ALL: [LoginSymbol; 4] = [
        LoginSymbol::ValidUser,
        LoginSymbol::InvalidUser,
        LoginSymbol::ValidSecret,
        LoginSymbol::InvalidSecret,
    ];

    /// One letter code.
    pub fn code(self) -> char {
        match self {
            LoginSymbol::ValidUser => 'u',
            LoginSymbol::InvalidUser => 'x',
            LoginSymbol::ValidSecret => 'p',
            LoginSymbol::InvalidSecret => 'y',
        }
    }
}

/// `q0 -u-> q1 -p-> q2`, any wrong answer drops into `qf`, which swallows everything. Only `q2` accepts.
pub fn login_nfa() -> Result<StateGraph<LoginSymbol>, BuildError> {
    use LoginSymbol::*;

    StateGraph::from_table(
        &["q0", "q1", "q2", "qf"],
        "q0",
        &["q2"],
        &[
            ("q0", ValidUser, &["q1"]),
            ("q0", InvalidUser, &["qf"]),
            ("q1", ValidSecret, &["q2"]),
            ("q1", InvalidSecret, &["qf"]),
            ("qf", ValidUser, &["qf"]),
            ("qf", InvalidUser, &["qf"]),
            ("qf", ValidSecret, &["qf"]),
            ("qf", InvalidSecret, &["qf"]),
        ],
        &[],
    )
}

/// Maps a pair of credentials onto the symbols the NFA reads.
pub fn classify<C: CredentialStore>(store: &C, identifier: &str, secret: &str) -> [LoginSymbol; 2] {
    let user = if store.knows(identifier) {
        LoginSymbol::ValidUser
    } else {
        LoginSymbol::InvalidUser
    };
    let secret = if store.verify(identifier, secret) {
        LoginSymbol::ValidSecret
    } else {
        LoginSymbol::InvalidSecret
    };
    [user, secret]
}
