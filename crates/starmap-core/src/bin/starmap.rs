//! Windowed starmap viewer.
//!
//! Usage: `starmap [graph.json] [config.json]`

use std::sync::Arc;

use anyhow::Context;
use bevy::prelude::*;
use starmap_core::bevy::{StarmapHeadlessPlugin, StarmapPlugin};
use starmap_core::config::StarmapConfig;
use starmap_core::leaderboard::{LeaderboardClient, client_from_config};

const DEFAULT_GRAPH: &str = "demos/toolbox.json";

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let graph_path = args.next().unwrap_or_else(|| DEFAULT_GRAPH.to_string());
    let config = match args.next() {
        Some(path) => StarmapConfig::load(&path).with_context(|| format!("failed to load config {path}"))?,
        None => StarmapConfig::default(),
    };

    let json = std::fs::read_to_string(&graph_path).with_context(|| format!("failed to read {graph_path}"))?;
    let leaderboard: Arc<dyn LeaderboardClient> = Arc::from(client_from_config(&config.leaderboard)?);
    let headless = StarmapHeadlessPlugin::from_json(&json, config)?.with_leaderboard(leaderboard);
    let title = headless.graph.title.clone().unwrap_or_else(|| "Starmap".to_string());

    let exit = App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.03)))
        .add_plugins(StarmapPlugin::new(headless))
        .run();
    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("viewer exited with code {code}"),
    }
}
