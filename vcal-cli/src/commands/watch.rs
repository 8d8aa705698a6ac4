use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use vcal_core::{CalendarApp, StoreKind, VcalConfig};

use crate::render::render_month;
use crate::utils::date::parse_month;
use crate::utils::tui;

/// The local store only publishes its own writes, so the file is re-read on
/// this interval to pick up edits from other processes.
const LOCAL_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run(config: &VcalConfig, month: Option<&str>) -> Result<()> {
    let reference = match month {
        Some(m) => parse_month(m)?,
        None => chrono::Local::now().date_naive(),
    };

    let mut app = super::open_app(config, reference).await?;
    let mut snapshots = app.store().subscribe();
    snapshots.borrow_and_update();

    let mut poll = tokio::time::interval(LOCAL_POLL_INTERVAL);
    poll.tick().await;

    draw(&app);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    anyhow::bail!("Event store closed");
                }
                let events = snapshots.borrow_and_update().clone();
                app.apply_snapshot(events);
                draw(&app);
            }
            _ = poll.tick(), if config.store == StoreKind::Local => {
                let before = app.events().to_vec();
                app.refresh().await?;
                if app.events() != before.as_slice() {
                    draw(&app);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }
    }
}

fn draw(app: &CalendarApp) {
    tui::clear_screen();
    println!("{}", render_month(&app.grid()));
    println!();
    println!(
        "{}",
        format!("{} events · Ctrl-C to quit", app.events().len()).dimmed()
    );
}
