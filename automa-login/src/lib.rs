//! Console login flows built on `automa`.
//!
//! Three ways to decide a login, all of them plain automata: the bounded-retry protocol DFA, a four symbol NFA
//! fed with the classification of the credentials, and a pair of literal matchers fed one character at a time.
//! This crate owns everything the engine deliberately does not: prompting, the credential store, and turning
//! answers into symbols.

pub mod console;
pub mod error;
pub mod flows;
pub mod literal;
pub mod store;
pub mod symbolic;

pub use console::Console;
pub use error::LoginError;
pub use flows::Flow;
pub use store::HashedStore;
