//! Collaborator transports, injected into the dispatcher at startup. No
//! ambient singletons: the process constructs one handle per transport and
//! passes it down.

pub mod email;
pub mod push;

use crate::error::Error;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err.0)
    }
}
