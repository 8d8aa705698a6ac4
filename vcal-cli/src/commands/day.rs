use anyhow::Result;
use owo_colors::OwoColorize;
use vcal_core::VcalConfig;

use crate::render::Render;
use crate::utils::date::date_or_today;

pub async fn run(config: &VcalConfig, date: Option<&str>) -> Result<()> {
    let date = date_or_today(date)?;
    let app = super::open_app(config, date).await?;

    println!("{}", date.format("%A %-d %B %Y").to_string().bold());

    let events = app.events_on(date);
    if events.is_empty() {
        println!("  {}", "No events".dimmed());
        return Ok(());
    }

    for event in events {
        println!("  {} {}", event.render(), event.id.dimmed());
    }

    Ok(())
}
