use anyhow::Context;
use campushub_sync::{AckOutcome, SendOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::page::state::PageState;

pub mod state;
pub mod terminal;

const QUIT_COMMAND: &str = "/quit";
const NOTIFICATIONS_COMMAND: &str = "/notifications";

/// Activates every engine the page has an anchor for and drives them until
/// stdin closes, the user quits, or a reply falls back to native submission.
pub async fn run_all(config: &AppConfig) -> anyhow::Result<()> {
    let (native_tx, mut native_rx) = mpsc::unbounded_channel();
    let state = PageState::try_init(config, native_tx)?;
    if !state.is_active() {
        info!("page has no thread or notification anchor, nothing to sync");
        return Ok(());
    }
    if let Some(thread) = &state.thread {
        thread.start().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_line(&state, &line).await {
                    break;
                }
            }
            Some(reply) = native_rx.recv() => {
                let submission = state
                    .transport
                    .submit_native(&reply.form, &reply.content)
                    .await?;
                println!(
                    "Reply submitted without live updates, server answered {} at {}",
                    submission.status, submission.location
                );
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    state.dispose().await;
    Ok(())
}

async fn handle_line(state: &PageState, line: &str) -> bool {
    match line.trim() {
        QUIT_COMMAND => return false,
        NOTIFICATIONS_COMMAND => {
            match &state.notifications {
                Some(notifications) => report_ack(notifications.open().await),
                None => println!("This page has no notification menu."),
            }
            return true;
        }
        _ => {}
    }
    let Some(thread) = &state.thread else {
        println!("This page has no message thread to reply to.");
        return true;
    };
    match thread.send(line).await {
        SendOutcome::Unavailable => println!("This thread does not accept replies."),
        SendOutcome::Unconfirmed => println!("Reply sent, it will appear with the next update."),
        SendOutcome::Degraded => println!("Live replies are off, reload the thread to continue."),
        SendOutcome::Empty
        | SendOutcome::Delivered { .. }
        | SendOutcome::Rejected(_)
        | SendOutcome::FellBack => {}
    }
    true
}

fn report_ack(outcome: AckOutcome) {
    match outcome {
        AckOutcome::Applied => {}
        AckOutcome::Skipped => info!("notifications are already being marked as seen"),
        AckOutcome::Failed => warn!("notifications could not be marked as seen"),
    }
}

/// Opens the notification menu once: loads the feed and marks it seen.
pub async fn open_notifications_once(config: &AppConfig) -> anyhow::Result<()> {
    let (native_tx, _native_rx) = mpsc::unbounded_channel();
    let state = PageState::try_init(config, native_tx)?;
    let Some(notifications) = &state.notifications else {
        info!("page has no notification anchor");
        return Ok(());
    };
    report_ack(notifications.open().await);
    Ok(())
}
