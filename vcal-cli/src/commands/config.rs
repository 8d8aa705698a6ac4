use anyhow::Result;
use owo_colors::OwoColorize;
use vcal_core::VcalConfig;

pub fn run(config: &VcalConfig) -> Result<()> {
    let config_path = VcalConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Events:     {}", config.data_path()?.display());
    if let Some(static_dir) = config.static_dir() {
        println!("  Static:     {}", static_dir.display());
    }

    println!();
    println!("{}", "Effective configuration".bold());
    for line in config.to_toml()?.lines() {
        println!("  {}", line);
    }

    Ok(())
}
