use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;
use vcal_core::{EventDraft, VcalConfig};

use super::EventFields;
use crate::render::Render;
use crate::utils::date::{date_or_today, parse_date};

pub async fn run(config: &VcalConfig, title: Option<String>, mut fields: EventFields) -> Result<()> {
    let interactive = title.is_none();

    // --- Title ---
    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    // --- Date ---
    let date = if let Some(d) = fields.date.take() {
        parse_date(&d)?
    } else if interactive {
        prompt_date()?
    } else {
        date_or_today(None)?
    };

    let draft = fields.apply(EventDraft::new(title, date))?;
    draft.validate()?;

    let mut app = super::open_app(config, date).await?;
    let event = app.save(None, draft).await?;

    if interactive {
        println!();
    }
    println!("{} {}", "  Created:".green(), event.render());
    println!("  {}", event.id.dimmed());

    Ok(())
}

/// Prompt for a date with retry on parse errors. Empty input means today.
fn prompt_date() -> Result<chrono::NaiveDate> {
    loop {
        let input: String = Input::new()
            .with_prompt("  When? (today)")
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        if input.is_empty() {
            return date_or_today(None);
        }
        match parse_date(&input) {
            Ok(date) => return Ok(date),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}
