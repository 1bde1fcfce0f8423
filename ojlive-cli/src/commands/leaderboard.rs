//! `ojlive leaderboard`: print a contest ranking, refreshing until stopped.

use anyhow::Context;
use clap::Args;
use ojlive_core::processors::{LeaderboardPoller, RankingOrder, RankingSource};
use ojlive_sdk::auth::AuthToken;
use ojlive_sdk::client::JudgeClient;
use ojlive_sdk::objects::{ContestId, RankingSnapshot};
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};

use crate::config::LoadedConfig;
use crate::render;
use crate::shutdown;

#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Contest id
    #[arg(long)]
    pub contest: String,

    /// Fetch once and exit instead of polling
    #[arg(long)]
    pub once: bool,
}

pub async fn run(
    config: &LoadedConfig,
    token: AuthToken,
    args: LeaderboardArgs,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let client = JudgeClient::new(config.server.base_url.clone());
    let contest_id = ContestId::new(args.contest);

    if args.once {
        let entries = client
            .fetch_ranking(&contest_id, &token)
            .await
            .with_context(|| format!("failed to fetch leaderboard of contest {contest_id}"))?;
        let mut snapshot = RankingSnapshot::new(entries, OffsetDateTime::now_utc());
        if config.leaderboard.order == RankingOrder::ByScore {
            snapshot.sort_by_score();
        }
        render::leaderboard(&snapshot);
        return Ok(());
    }

    let poller = LeaderboardPoller::new(client, config.leaderboard);
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel();
    let handle = poller.start(contest_id, token, move |snapshot| {
        let _ = snapshot_tx.send(snapshot);
    });

    loop {
        tokio::select! {
            biased;

            _ = shutdown::requested(&mut shutdown_rx) => break,

            Some(snapshot) = snapshot_rx.recv() => render::leaderboard(&snapshot),

            else => break,
        }
    }

    handle.stopped().await;
    Ok(())
}
