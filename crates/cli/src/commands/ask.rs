//! `colloquy ask`: one-shot question.

use colloquy_config::AppConfig;
use std::io::Write;
use std::path::PathBuf;

pub async fn run(
    question: &str,
    ingest: Vec<PathBuf>,
    reference: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let (runner, mut conversation) =
        super::build_session(&config, &ingest, reference.as_deref()).await?;

    runner
        .run_turn(&mut conversation, question, |fragment| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    Ok(())
}
