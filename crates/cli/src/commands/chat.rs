//! `colloquy chat`: interactive conversation with streamed replies.

use colloquy_config::AppConfig;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(ingest: Vec<PathBuf>, reference: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let (runner, mut conversation) =
        super::build_session(&config, &ingest, reference.as_deref()).await?;

    println!();
    println!("  Colloquy (model: {})", config.default_model);
    println!("  Type your message and press Enter. Type 'exit' to quit.");
    println!();
    println!("  Assistant > {}", conversation.greeting().content);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        print!("\n  Assistant > ");
        std::io::stdout().flush()?;

        let outcome = runner
            .run_turn(&mut conversation, input, |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;

        match outcome {
            Ok(report) => {
                println!();
                if report.stats.dropped_messages > 0 {
                    println!(
                        "  [{} context tokens, {} older messages dropped]",
                        report.stats.total_tokens, report.stats.dropped_messages
                    );
                }
                println!();
            }
            Err(e) => {
                println!();
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
