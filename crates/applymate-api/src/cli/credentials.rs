//! Credential pool usage table.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use applymate_core::llm::credential_pool::CredentialPool;

pub fn list_credentials(pool: &CredentialPool, json: bool) -> Result<()> {
    let stats = pool.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Req/min").fg(Color::White),
        Cell::new("Req/day").fg(Color::White),
        Cell::new("Tokens/min").fg(Color::White),
        Cell::new("Tokens/day").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for stat in &stats {
        let status_cell = if stat.available {
            Cell::new("● available").fg(Color::Green)
        } else {
            Cell::new("○ limited").fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(stat.key_id.to_string()).fg(Color::Cyan),
            Cell::new(&stat.rpm),
            Cell::new(&stat.rpd),
            Cell::new(&stat.tpm),
            Cell::new(&stat.tpd),
            status_cell,
        ]);
    }

    let available = stats.iter().filter(|s| s.available).count();
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} of {} credential{} available",
        style(available).bold(),
        stats.len(),
        if stats.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
