use crate::settings::{settings_file_exists, settings_path, Settings, EXTERNAL_API_KEY_VAR};

pub fn run(settings: &Settings) -> crate::error::Result<()> {
    let path = settings_path();
    let source = if settings_file_exists() { "" } else { " (not found, using defaults)" };
    println!("Settings:     {}{source}", path.display());
    println!("Placeholder:  {}", settings.placeholder_description);
    println!("Output file:  {}", settings.output_file);
    println!();
    let e = &settings.export;
    println!("Server date:  {}", e.server_date);
    println!("Language:     {}", e.language);
    println!("Currency:     {}", e.currency);
    println!("Bank ID:      {}", e.bank_id);
    println!("Account ID:   {}", e.account_id);
    println!("Account type: {}", e.account_type);
    println!();
    println!(
        "{EXTERNAL_API_KEY_VAR}: {} (unused)",
        if settings.external_api_key.is_some() { "set" } else { "not set" }
    );
    Ok(())
}
