use async_trait::async_trait;
use ipguard_domain::{DomainError, MacAddr};
use std::net::Ipv4Addr;
use tokio::time::Instant;

/// Link-layer IPv4 → MAC resolution over a single interface.
///
/// Implementations hold one pending request and one deadline, so callers must
/// serialize access. `resolve` reports [`DomainError::NoAnswer`] when the
/// deadline passes without a reply; every other error is a transport fault.
#[async_trait]
pub trait ArpResolver: Send {
    /// Absolute deadline applied to subsequent `resolve` calls.
    fn set_deadline(&mut self, deadline: Instant);

    async fn resolve(&mut self, ip: Ipv4Addr) -> Result<MacAddr, DomainError>;
}
