use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use vcal_core::VcalConfig;

use crate::render::Render;

pub async fn run(config: &VcalConfig, id: &str, force: bool) -> Result<()> {
    let mut app = super::open_app(config, chrono::Local::now().date_naive()).await?;
    let event = app.get(id)?.clone();

    println!("  {}", event.render());
    println!("  {}", event.render_span().dimmed());

    // Confirm unless --force
    if !force {
        let prompt = if event.is_recurring() {
            format!("Delete \"{}\" and all its repeats?", event.title)
        } else {
            format!("Delete \"{}\"?", event.title)
        };
        let confirmed = Confirm::new().with_prompt(prompt).default(false).interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    app.delete(&event.id).await?;
    println!("{}", format!("  Deleted: {}", event.title).red());

    Ok(())
}
