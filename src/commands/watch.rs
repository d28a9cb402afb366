//! Continuous watch command: run the engine loop, print board snapshots.

use anyhow::Result;
use std::time::Duration;

use crate::config::Config;
use crate::engine::Engine;

pub async fn watch(config: Config, name: String) -> Result<()> {
    let step = config.rotation.step().max(Duration::from_millis(10));
    let mut engine = Engine::new(config)?;
    engine.on_app_name(&name);

    println!("Watching '{name}' (ctrl-c to stop)");

    let mut last_board: Option<String> = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nstopping");
                return Ok(());
            }
            _ = tokio::time::sleep(step) => {
                engine.tick().await;
            }
        }

        if !engine.is_active() {
            continue;
        }

        let Some(board) = engine.current_board() else {
            continue;
        };
        // Reprint only when the visible board changes.
        if last_board.as_deref() == Some(board.name.as_str()) {
            continue;
        }
        last_board = Some(board.name.clone());

        let title = engine.game_title().unwrap_or(&name);
        let cursor = engine
            .variant_cursor()
            .map(|(p, n)| format!(" [variant {}/{}]", p + 1, n))
            .unwrap_or_default();
        println!("\n{title}{cursor} / {}", board.name);
        for row in &board.rows {
            if row.metric.is_empty() {
                println!("  {}. {}", row.rank, row.name);
            } else {
                println!("  {}. {}  {}", row.rank, row.name, row.metric);
            }
        }
    }
}
