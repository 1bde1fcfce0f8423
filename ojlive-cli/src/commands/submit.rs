//! `ojlive submit`: dispatch a submission and follow it to a verdict.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ojlive_core::session::JudgeSession;
use ojlive_sdk::auth::AuthToken;
use ojlive_sdk::client::JudgeClient;
use ojlive_sdk::objects::{Language, ProblemId, SourceCode, UserId};
use tokio::sync::watch;

use crate::config::LoadedConfig;
use crate::render;
use crate::shutdown;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Submitting user id
    #[arg(long)]
    pub user: String,

    /// Problem id
    #[arg(long)]
    pub problem: String,

    /// Language name as the judge knows it (e.g. python, cpp)
    #[arg(long)]
    pub language: String,

    /// Source file to submit
    #[arg(long)]
    pub file: PathBuf,
}

/// Returns whether the submission was accepted.
pub async fn run(
    config: &LoadedConfig,
    token: AuthToken,
    args: SubmitArgs,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let source = SourceCode::new(text)?;

    let client = JudgeClient::new(config.server.base_url.clone());
    let session = JudgeSession::new(client, config.channel.transport, config.channel.channel);

    let watched = session
        .submit_and_watch(
            &ProblemId::new(args.problem),
            &UserId::new(args.user),
            &token,
            &source,
            &Language::new(args.language),
        )
        .await?;
    render::dispatched(&watched.current());

    let mut state = watched.state.clone();
    loop {
        tokio::select! {
            biased;

            _ = shutdown::requested(&mut shutdown_rx) => {
                watched.cancel();
                break;
            }

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let submission = state.borrow_and_update().clone();
                if submission.is_sealed() {
                    break;
                }
                if !submission.is_terminal() {
                    render::progress(&submission);
                }
            }
        }
    }

    let (submission, reason) = watched.finished().await;
    render::verdict(&submission, reason);
    Ok(submission.is_accepted())
}
