use async_trait::async_trait;
use ipguard_application::ports::ArpResolver;
use ipguard_domain::{DomainError, MacAddr};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Outcome {
    Reply(MacAddr),
    /// Waits for the deadline, then reports no answer.
    Silence,
    Fail(DomainError),
}

/// Replays queued outcomes and records every deadline and queried address.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    deadlines: Arc<Mutex<Vec<Instant>>>,
    queries: Arc<Mutex<Vec<Ipv4Addr>>>,
    current_deadline: Option<Instant>,
}

impl ScriptedResolver {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            ..Self::default()
        }
    }

    pub fn replying(mac: &str) -> Self {
        Self::new(vec![Outcome::Reply(mac.parse().unwrap())])
    }

    pub fn silent() -> Self {
        Self::new(vec![Outcome::Silence])
    }

    pub fn failing(error: DomainError) -> Self {
        Self::new(vec![Outcome::Fail(error)])
    }

    pub fn deadlines(&self) -> Vec<Instant> {
        self.deadlines.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<Ipv4Addr> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArpResolver for ScriptedResolver {
    fn set_deadline(&mut self, deadline: Instant) {
        self.deadlines.lock().unwrap().push(deadline);
        self.current_deadline = Some(deadline);
    }

    async fn resolve(&mut self, ip: Ipv4Addr) -> Result<MacAddr, DomainError> {
        self.queries.lock().unwrap().push(ip);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Silence);

        match outcome {
            Outcome::Reply(mac) => Ok(mac),
            Outcome::Silence => {
                if let Some(deadline) = self.current_deadline {
                    tokio::time::sleep_until(deadline).await;
                }
                Err(DomainError::NoAnswer)
            }
            Outcome::Fail(e) => Err(e),
        }
    }
}

/// Records entry/exit instants of every resolve and flags overlapping use.
#[derive(Clone)]
pub struct InstrumentedResolver {
    hold: Duration,
    reply: MacAddr,
    in_flight: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
    spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
}

impl InstrumentedResolver {
    pub fn new(hold: Duration, reply: MacAddr) -> Self {
        Self {
            hold,
            reply,
            in_flight: Arc::new(AtomicUsize::new(0)),
            overlaps: Arc::new(AtomicUsize::new(0)),
            spans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArpResolver for InstrumentedResolver {
    fn set_deadline(&mut self, _deadline: Instant) {
        if self.in_flight.load(Ordering::SeqCst) != 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn resolve(&mut self, _ip: Ipv4Addr) -> Result<MacAddr, DomainError> {
        let entered = Instant::now();
        if self.in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        tokio::time::sleep(self.hold).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.spans.lock().unwrap().push((entered, Instant::now()));
        Ok(self.reply)
    }
}
