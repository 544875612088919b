use crate::error::Result;
use crate::settings::{save_settings, settings_file_exists, settings_path, Settings};

pub fn run(force: bool) -> Result<()> {
    if settings_file_exists() && !force {
        println!(
            "Settings already exist at {} (use --force to overwrite).",
            settings_path().display()
        );
        return Ok(());
    }
    let path = save_settings(&Settings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
