//! Autonomous orchestration engine for an operative network.
//!
//! The engine watches a registry of triggers, asks an AI gateway to
//! plan actions when one fires, applies those actions to the network
//! state, and persists everything to JSON files under a data directory.
//!
//! # Quick Start
//!
//! ```ignore
//! use daemon_core::daemon::{Daemon, DaemonConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut daemon, stop) = Daemon::new(DaemonConfig::default()).await?;
//!
//!     tokio::spawn(async move {
//!         tokio::signal::ctrl_c().await.ok();
//!         stop.stop();
//!     });
//!
//!     daemon.run().await?;
//!     Ok(())
//! }
//! ```

pub mod daemon;
pub mod evaluator;
pub mod executor;
pub mod network;
pub mod persist;
pub mod testing;

pub use daemon::{Daemon, DaemonConfig, DaemonError, StopHandle, TriggerAuthoring};
pub use executor::{ActionOutcome, ActionRecord, ActionStatus};
pub use network::{
    Metric, NetworkContext, NetworkState, Operative, OperativeId, Quest, QuestError, QuestId,
    QuestRequirements, QuestRewards, QuestStatus, Trigger, TriggerCondition, TriggerId,
};
pub use persist::{NetworkEvent, PersistError, StateStore};
