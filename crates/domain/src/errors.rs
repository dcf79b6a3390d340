use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    #[error("Network interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Failed to open ARP resolver on {interface}: {reason}")]
    ResolverInit { interface: String, reason: String },

    /// No host answered before the resolver deadline.
    #[error("No ARP reply before deadline")]
    NoAnswer,

    #[error("Caller deadline exceeded before an ARP reply arrived")]
    DeadlineExceeded,

    #[error("Malformed ARP reply: {0}")]
    MalformedArpReply(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
