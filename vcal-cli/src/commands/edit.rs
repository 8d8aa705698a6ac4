use anyhow::Result;
use owo_colors::OwoColorize;
use vcal_core::VcalConfig;

use super::EventFields;
use crate::render::Render;

pub async fn run(
    config: &VcalConfig,
    id: &str,
    title: Option<String>,
    fields: EventFields,
) -> Result<()> {
    let mut app = super::open_app(config, chrono::Local::now().date_naive()).await?;

    let mut draft = app.get(id)?.to_draft();
    if let Some(title) = title {
        draft.title = title;
    }
    let draft = fields.apply(draft)?;

    let event = app.save(Some(id), draft).await?;
    println!("{} {}", "  Updated:".yellow(), event.render());

    Ok(())
}
