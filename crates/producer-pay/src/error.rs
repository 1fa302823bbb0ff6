//! error types for producer-pay

use crate::name::Name;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing authority of {0}")]
    MissingAuthority(Name),

    // === claim preconditions ===
    #[error("payments locked down after {0}")]
    PaymentsLocked(String),

    #[error("unable to find key: producer {0} is not registered")]
    UnknownProducer(Name),

    #[error("producer does not have an active key")]
    InactiveProducer(Name),

    #[error("claim time {now} is before the last claim at {last}")]
    ClockRegression { now: String, last: String },

    #[error("fee rate {0} is outside [0, 1]")]
    InvalidFeeRate(f64),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    // === primitives ===
    #[error("invalid name {0:?}: {1}")]
    InvalidName(String, &'static str),

    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    // === token ledger ===
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("symbol mismatch: ledger holds {expected}, got {got}")]
    SymbolMismatch { expected: String, got: String },

    #[error("tokens can only be issued to issuer account {0}")]
    IssueTarget(Name),

    #[error("cannot transfer to self ({0})")]
    SelfTransfer(Name),

    #[error("overdrawn balance: {account} holds {balance}, needs {needed}")]
    Overdrawn {
        account: Name,
        balance: i64,
        needed: i64,
    },

    // === tables ===
    #[error("record for {0} already exists in {1}")]
    DuplicateRecord(Name, &'static str),

    // === ambient ===
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(format!("sled: {}", e))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Codec(format!("bincode: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(format!("json: {}", e))
    }
}
