use ipguard_application::services::ConflictDetector;
use ipguard_domain::DomainError;
use std::time::Duration;
use tracing::info;

use crate::arp::RawArpResolver;
use crate::system::LinkInterface;

/// Builds a [`ConflictDetector`] backed by a raw ARP socket on `interface`.
///
/// Must be called from within a tokio runtime. The socket lives as long as the
/// returned detector.
pub fn open_conflict_detector(
    interface: &str,
    timeout: Duration,
) -> Result<ConflictDetector, DomainError> {
    if timeout.is_zero() {
        return Err(DomainError::ConfigError(
            "Detector timeout must be greater than 0".to_string(),
        ));
    }

    let link = LinkInterface::by_name(interface)?;
    let resolver = RawArpResolver::open(&link)?;

    info!(
        interface = %link.name,
        timeout_ms = timeout.as_millis() as u64,
        "Conflict detector ready"
    );

    Ok(ConflictDetector::new(Box::new(resolver), timeout))
}
