//! One-shot resolution command: resolve a name, print its boards.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::engine::Engine;
use crate::models::Board;

pub async fn resolve(
    config: Config,
    name: String,
    timeout_secs: u64,
    diagnostics: bool,
) -> Result<()> {
    let mut engine = Engine::new(config)?;
    engine.on_app_name(&name);

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    while !engine.is_active() && Instant::now() < deadline {
        engine.tick().await;
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    if !engine.is_active() {
        if diagnostics {
            engine.dump_match_debug();
        }
        anyhow::bail!(
            "could not resolve '{name}' within {timeout_secs}s (state: {:?})",
            engine.state()
        );
    }

    println!("{}", engine.game_title().unwrap_or(&name));
    if let Some((position, size)) = engine.variant_cursor() {
        println!(
            "variant {}/{} of pool [{}]",
            position + 1,
            size,
            engine.title_pool().join(", ")
        );
    }
    if let Some(root) = engine.work_root() {
        println!("root: {root}");
    }
    println!();

    if let Some(board) = engine.current_board() {
        print_board(board);
    }

    if diagnostics {
        engine.dump_match_debug();
    }

    Ok(())
}

fn print_board(board: &Board) {
    println!("== {} ==", board.name);
    for row in &board.rows {
        let mut line = format!("{}. {}", row.rank, row.name);
        if !row.metric.is_empty() {
            line.push_str(&format!("  {}", row.metric));
        }
        for extra in &row.extras {
            line.push_str(&format!("  · {extra}"));
        }
        println!("{line}");
    }
}
