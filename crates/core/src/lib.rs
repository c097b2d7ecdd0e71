//! `pulseboard-core` — dashboard widget domain primitives.
//!
//! Pure, synchronous building blocks (no IO, no async):
//! - `ResourceState`: last known polled value with stale-while-error semantics
//! - `CounterSet` + `ActivitySimulator`: monotonic simulated metrics
//! - `ActivityLog`: bounded FIFO of display events
//! - `ActivationMachine`: the idle/activating/active/stopping/error machine

pub mod activation;
pub mod counters;
pub mod error;
pub mod id;
pub mod log;
pub mod random;
pub mod resource;
pub mod simulator;

pub use activation::{ActivationMachine, ActivationState, ActivationTicket, Transition};
pub use counters::{CounterSet, CounterSpec};
pub use error::{CoreError, CoreResult};
pub use id::{LogEntryId, WidgetId};
pub use log::{ActivityLog, DEFAULT_LOG_CAPACITY, LogEntry, Severity};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use resource::ResourceState;
pub use simulator::{ActivitySimulator, SimulatorProfile, TickReport};
