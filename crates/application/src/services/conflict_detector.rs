use ipguard_domain::{DomainError, MacAddr};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::ports::ArpResolver;

/// Which bound produced the effective deadline of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineSource {
    /// `now + timeout` was the tighter (or equal) bound.
    Timeout,
    /// The caller's deadline expires before `now + timeout`.
    Caller,
}

/// Tighter of `now + timeout` and the caller deadline. A missing caller
/// deadline counts as unbounded.
pub fn effective_deadline(
    now: Instant,
    timeout: Duration,
    caller: Option<Instant>,
) -> (Instant, DeadlineSource) {
    let max = now + timeout;
    match caller {
        Some(deadline) if deadline < max => (deadline, DeadlineSource::Caller),
        _ => (max, DeadlineSource::Timeout),
    }
}

struct Session {
    resolver: Box<dyn ArpResolver>,
    // Reserved for a known-bindings fast path; nothing reads or writes it yet.
    #[allow(dead_code)]
    seen: HashMap<String, MacAddr>,
}

/// Asks the local segment whether an IPv4 address is already held by another
/// MAC before it is bound.
///
/// All queries share one resolver and run one at a time. Errors never reach the
/// caller: anything other than a clean reply or silence is logged and treated
/// as "no conflict", so a broken socket cannot stall address assignment.
pub struct ConflictDetector {
    session: Mutex<Session>,
    timeout: Duration,
}

impl ConflictDetector {
    pub fn new(resolver: Box<dyn ArpResolver>, timeout: Duration) -> Self {
        Self {
            session: Mutex::new(Session {
                resolver,
                seen: HashMap::new(),
            }),
            timeout,
        }
    }

    /// Returns `true` only when a host answers for `ip` with a MAC other than
    /// `mac`.
    #[instrument(skip(self, deadline, mac), fields(mac = %mac), level = "debug")]
    pub async fn would_conflict(
        &self,
        deadline: Option<Instant>,
        ip: Ipv4Addr,
        mac: MacAddr,
    ) -> bool {
        let mut session = self.session.lock().await;

        // Measured after the lock so queued callers still get a full timeout.
        let (deadline, source) = effective_deadline(Instant::now(), self.timeout, deadline);
        session.resolver.set_deadline(deadline);

        match session.resolver.resolve(ip).await {
            Ok(existing) => {
                let conflict = existing != mac;
                debug!(ip = %ip, existing = %existing, candidate = %mac, conflict, "ARP reply received");
                conflict
            }
            Err(DomainError::NoAnswer) if source == DeadlineSource::Timeout => {
                debug!(ip = %ip, "No ARP reply, address unused");
                false
            }
            Err(DomainError::NoAnswer) => {
                log_resolve_error(ip, &DomainError::DeadlineExceeded);
                false
            }
            Err(e) => {
                log_resolve_error(ip, &e);
                false
            }
        }
    }
}

fn log_resolve_error(ip: Ipv4Addr, error: &DomainError) {
    warn!(ip = %ip, error = %error, "error resolving {}: {}", ip, error);
}
