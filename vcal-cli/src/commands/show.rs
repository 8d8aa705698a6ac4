use anyhow::Result;
use owo_colors::OwoColorize;
use vcal_core::VcalConfig;

pub async fn run(config: &VcalConfig, id: &str, json: bool) -> Result<()> {
    let app = super::open_app(config, chrono::Local::now().date_naive()).await?;
    let event = app.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(event)?);
        return Ok(());
    }

    println!("{}", event.title.bold());
    println!("  When:       {}", event.render_span());
    if event.is_recurring() {
        let until = event
            .recurrence
            .until
            .map(|d| format!(" until {}", d))
            .unwrap_or_default();
        println!("  Repeats:    {}{}", event.recurrence.rule, until);
    }
    if let Some(location) = &event.location {
        println!("  Where:      {}", location);
    }
    if let Some(description) = &event.description {
        println!("  Notes:      {}", description);
    }
    println!("  Color:      {}", event.color);
    println!("  Id:         {}", event.id.dimmed());

    Ok(())
}
