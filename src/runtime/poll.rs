//! Per-conversation poll scheduling
//!
//! `PollScheduler` is the pure state machine: `Idle -> Active -> Idle`, one
//! generation per activation, at most one fetch outstanding. A fetch asked
//! for while another is outstanding is remembered and issued once the
//! outstanding one completes. The ticker task
//! only produces `Tick` events; the conversation runtime decides what to do
//! with them.

use super::executor::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polling behaviour of a conversation view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// When false the feed is fetched on activation and after sends only
    pub enabled: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Active { generation: u64, in_flight: bool },
}

/// Proof that a fetch was started, tagged with its activation generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct PollScheduler {
    state: PollState,
    last_generation: u64,
    /// A fetch was deferred behind the outstanding one
    refetch: bool,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            state: PollState::Idle,
            last_generation: 0,
            refetch: false,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn active_generation(&self) -> Option<u64> {
        match self.state {
            PollState::Active { generation, .. } => Some(generation),
            PollState::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_generation().is_some()
    }

    /// Enter `Active` with a fresh generation. `None` if already active.
    pub fn activate(&mut self) -> Option<u64> {
        if self.is_active() {
            return None;
        }
        self.last_generation += 1;
        self.refetch = false;
        self.state = PollState::Active {
            generation: self.last_generation,
            in_flight: false,
        };
        Some(self.last_generation)
    }

    /// Return to `Idle`. Fetches still in flight become stale.
    pub fn deactivate(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = PollState::Idle;
        self.refetch = false;
        was_active
    }

    /// Start a fetch unless idle or one is already outstanding
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        match &mut self.state {
            PollState::Active {
                generation,
                in_flight,
            } if !*in_flight => {
                *in_flight = true;
                Some(FetchTicket {
                    generation: *generation,
                })
            }
            _ => None,
        }
    }

    /// Ask for another fetch after the outstanding one. False when idle or
    /// nothing is outstanding, in which case `begin_fetch` should be used.
    pub fn defer_fetch(&mut self) -> bool {
        match self.state {
            PollState::Active {
                in_flight: true, ..
            } => {
                self.refetch = true;
                true
            }
            _ => false,
        }
    }

    /// Consume a deferred fetch request
    pub fn take_refetch(&mut self) -> bool {
        std::mem::take(&mut self.refetch)
    }

    /// Finish a fetch. True if its result may be applied: the ticket belongs
    /// to the current activation.
    pub fn finish_fetch(&mut self, ticket: FetchTicket) -> bool {
        match &mut self.state {
            PollState::Active {
                generation,
                in_flight,
            } if *generation == ticket.generation => {
                *in_flight = false;
                true
            }
            _ => false,
        }
    }
}

/// Spawn the interval task for one activation. The first tick fires
/// immediately.
pub(crate) fn spawn_ticker(
    period: Duration,
    generation: u64,
    event_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if event_tx.send(Event::Tick { generation }).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(generation, "Poll ticker stopped");
    })
}
