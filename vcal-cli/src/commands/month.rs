use anyhow::Result;
use vcal_core::VcalConfig;

use crate::render::render_month;
use crate::utils::date::parse_month;

pub async fn run(config: &VcalConfig, month: Option<&str>, offset: i64) -> Result<()> {
    let reference = match month {
        Some(m) => parse_month(m)?,
        None => chrono::Local::now().date_naive(),
    };

    let mut app = super::open_app(config, reference).await?;
    let delta = i32::try_from(offset).map_err(|_| anyhow::anyhow!("Month offset too large"))?;
    app.change_month(delta);

    println!("{}", render_month(&app.grid()));
    Ok(())
}
