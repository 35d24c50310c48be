//! Timer-driven synthetic event source.

use super::{Transport, TransportSession};
use crate::error::TransportError;
use crate::event::{CallEvent, CallEventData, CallEventType};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

/// Default interval between synthetic events.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(15);

const STATUSES: [&str; 4] = ["active", "on_hold", "completed", "wrap_up"];

/// Produces one random [`CallEvent`] per tick once connected.
#[derive(Debug)]
pub struct SimulatedTransport {
    tick_interval: Duration,
    seed: Option<u64>,
    connections: AtomicU64,
}

impl SimulatedTransport {
    /// Create a simulated transport ticking every `tick_interval`.
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            seed: None,
            connections: AtomicU64::new(0),
        }
    }

    /// Use a fixed RNG seed. Each connection derives its own stream from it.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Interval between events.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of sessions opened so far.
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn connect(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        let connection = self.connections.fetch_add(1, Ordering::SeqCst);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(connection)),
            None => StdRng::from_entropy(),
        };

        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            connection = connection,
            interval_ms = self.tick_interval.as_millis() as u64,
            "Simulated transport connected"
        );

        Ok(Box::new(SimulatedSession { ticker, rng }))
    }
}

struct SimulatedSession {
    ticker: Interval,
    rng: StdRng,
}

#[async_trait]
impl TransportSession for SimulatedSession {
    async fn next_event(&mut self) -> Result<CallEvent, TransportError> {
        self.ticker.tick().await;
        let event = synthesize_event(&mut self.rng);
        trace!(event = %event.event_type, "Synthetic event generated");
        Ok(event)
    }
}

/// Build a random event of a uniformly chosen type.
pub fn synthesize_event<R: Rng + ?Sized>(rng: &mut R) -> CallEvent {
    let event_type = CallEventType::ALL[rng.gen_range(0..CallEventType::ALL.len())];
    let data = CallEventData::now()
        .with_call_id(format!("call_{}", rng.gen_range(1000..10_000)))
        .with_agent_id(format!("agent_{}", rng.gen_range(1..=50)))
        .with_detail("duration", serde_json::json!(rng.gen_range(30..=900)))
        .with_detail(
            "status",
            serde_json::json!(STATUSES[rng.gen_range(0..STATUSES.len())]),
        );
    CallEvent::new(event_type, data)
}
