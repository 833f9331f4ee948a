//! Bootstrap a network data directory and run the orchestration loop.
//!
//! Seeds a couple of starter quests on first run, then evaluates
//! triggers until interrupted. Needs ANTHROPIC_API_KEY (or
//! OPENAI_API_KEY with DEFAULT_AI=openai) for the AI-gated operations.
//!
//! Run with: cargo run --example bootstrap_network

use daemon_core::{
    Daemon, DaemonConfig, Quest, QuestRequirements, QuestRewards,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let (mut daemon, stop) = Daemon::new(DaemonConfig::default()).await?;

    if daemon.state().quests.is_empty() {
        daemon
            .create_quest(Quest::new(
                "First Contact",
                "Establish a presence on the network and report in.",
                1,
                QuestRewards { reputation: 50 },
                QuestRequirements {
                    min_rank: 1,
                    skills: vec![],
                },
            ))
            .await?;
        daemon
            .create_quest(Quest::new(
                "Network Infiltration",
                "Map the relay topology and identify weak nodes.",
                3,
                QuestRewards { reputation: 150 },
                QuestRequirements {
                    min_rank: 2,
                    skills: vec!["recon".to_string()],
                },
            ))
            .await?;
    }

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        stop.stop();
    });

    daemon.run().await?;
    Ok(())
}
