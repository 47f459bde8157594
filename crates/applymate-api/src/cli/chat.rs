//! One-shot chat turn from the command line.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state::AppState;

pub async fn chat(state: &AppState, user: &str, message: &[String], json: bool) -> Result<()> {
    let message = message.join(" ");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let reply = state.coordinator.resolve(&message, user).await;
    spinner.finish_and_clear();
    let reply = reply?;

    if json {
        let out = serde_json::json!({
            "user_id": user,
            "message": message,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("you").dim(), message);
    println!();
    for line in reply.lines() {
        println!("  {line}");
    }
    println!();

    Ok(())
}
