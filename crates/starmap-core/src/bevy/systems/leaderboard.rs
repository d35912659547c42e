//! Leaderboard service systems.
//!
//! Scene events that need I/O are batched into one fire-and-forget task on
//! the `IoTaskPool`; jobs in a batch run in order so a ranking fetched
//! after a submission sees it. Replies come back through [`RankingInbox`].

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;

use crate::bevy::{
    LeaderboardEvent, LeaderboardReply, LeaderboardRes, PointerCaptureEvent, RankingInbox, SceneRes,
};
use crate::leaderboard::{LeaderboardClient, LeaderboardEntry};
use crate::scene::SceneEvent;

enum Job {
    Persist(LeaderboardEntry),
    Fetch(usize),
}

pub fn service_leaderboard(
    mut scene: ResMut<SceneRes>,
    board: Res<LeaderboardRes>,
    inbox: Res<RankingInbox>,
    mut capture: MessageWriter<PointerCaptureEvent>,
) {
    let mut jobs = Vec::new();
    for event in scene.0.drain_events() {
        match event {
            SceneEvent::PointerCapture(captured) => {
                capture.write(PointerCaptureEvent { captured });
            }
            SceneEvent::PersistScore(entry) => jobs.push(Job::Persist(entry)),
            SceneEvent::RankingRequested(limit) => jobs.push(Job::Fetch(limit)),
        }
    }
    if jobs.is_empty() {
        return;
    }

    tracing::debug!("[leaderboard] dispatching {} job(s)", jobs.len());
    let client = board.0.clone();
    let inbox = inbox.clone();
    IoTaskPool::get()
        .spawn(async move {
            for job in jobs {
                inbox.push(run_job(client.as_ref(), job));
            }
        })
        .detach();
}

fn run_job(client: &dyn LeaderboardClient, job: Job) -> LeaderboardReply {
    match job {
        Job::Persist(entry) => {
            let (name, score) = (entry.name.clone(), entry.score);
            match client.submit(entry) {
                Ok(()) => LeaderboardReply::Submitted { name, score },
                Err(err) => {
                    tracing::warn!("[leaderboard] submit failed: {err}");
                    LeaderboardReply::Failed(err.to_string())
                }
            }
        }
        Job::Fetch(limit) => match client.list(limit) {
            Ok(entries) => LeaderboardReply::Ranking(entries),
            Err(err) => {
                tracing::warn!("[leaderboard] list failed: {err}");
                LeaderboardReply::Failed(err.to_string())
            }
        },
    }
}

/// Hands finished replies to the scene.
pub fn collect_rankings(
    inbox: Res<RankingInbox>,
    mut scene: ResMut<SceneRes>,
    mut events: MessageWriter<LeaderboardEvent>,
) {
    for reply in inbox.drain() {
        match reply {
            LeaderboardReply::Submitted { name, score } => {
                tracing::info!("[leaderboard] stored {name} ({score})");
                events.write(LeaderboardEvent::Submitted { name, score });
            }
            LeaderboardReply::Ranking(entries) => {
                let count = entries.len();
                scene.0.receive_ranking(entries);
                events.write(LeaderboardEvent::RankingLoaded { count });
            }
            LeaderboardReply::Failed(reason) => {
                events.write(LeaderboardEvent::Failed { reason });
            }
        }
    }
}
