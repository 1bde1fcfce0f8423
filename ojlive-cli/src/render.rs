//! Terminal output.
//!
//! Results go to stdout; logs go to stderr.

use ojlive_core::events::CloseReason;
use ojlive_core::submission::Submission;
use ojlive_sdk::objects::{RankingSnapshot, SubmissionStatus};

pub fn dispatched(submission: &Submission) {
    println!(
        "Submitted {} ({} / {}) as {}",
        submission.problem_id, submission.language, submission.user_id, submission.id
    );
}

pub fn progress(submission: &Submission) {
    println!("  {}", submission.status);
}

pub fn verdict(submission: &Submission, reason: CloseReason) {
    let diagnostics = &submission.diagnostics;
    match reason {
        CloseReason::Completed if submission.is_terminal() => {}
        CloseReason::Completed => println!("Judge finished without a verdict"),
        CloseReason::TimedOut => println!("Gave up waiting for the judge"),
        CloseReason::TransportFailed => println!("Lost the connection to the judge"),
        CloseReason::Cancelled => println!("Cancelled"),
    }
    if let Some(error) = &submission.last_error {
        println!("  last error: {error}");
    }

    let score = submission
        .score
        .map_or_else(|| "-".to_owned(), |score| score.to_string());
    println!("Result: {} (score {score})", submission.status);
    if !diagnostics.time.is_empty() || !diagnostics.memory.is_empty() {
        println!("  time {}s, memory {} KiB", diagnostics.time, diagnostics.memory);
    }
    if submission.status == SubmissionStatus::CompileError && !diagnostics.compile_output.is_empty()
    {
        println!("--- compiler output ---\n{}", diagnostics.compile_output.trim_end());
    }
    if !diagnostics.stderr.is_empty() {
        println!("--- stderr ---\n{}", diagnostics.stderr.trim_end());
    }
    for case in &diagnostics.wrong_answers {
        println!("--- test case {} ---\n{}", case.test_case_id, case.stdout.trim_end());
    }
    if !diagnostics.message.is_empty() {
        println!("{}", diagnostics.message);
    }
}

pub fn leaderboard(snapshot: &RankingSnapshot) {
    println!("Leaderboard at {}", snapshot.fetched_at);
    if snapshot.is_empty() {
        println!("  (no entries)");
        return;
    }
    for (rank, entry) in snapshot.ranked() {
        println!("{rank:>4}  {:<24} {:>8}", entry.username, entry.total_score);
    }
}
