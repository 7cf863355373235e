use crate::credentials::default_store;
use crate::error::Result;
use crate::settings::{load_settings, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let logged_in = match default_store().get() {
        Ok(token) => token.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read credential store");
            false
        }
    };

    println!("API:        {}", settings.api_url());
    println!("Data dir:   {}", settings.data_dir);
    println!("Exports:    {}", settings.exports_dir().display());
    println!("Settings:   {}", settings_path().display());
    println!("Company:    {}", settings.company_name);

    let years = settings.report_years();
    println!();
    println!("Report years:  {}-{}", years.start(), years.end());
    println!("Page size:     {}", settings.items_per_page);
    println!(
        "Session:       {}",
        if logged_in {
            "logged in"
        } else {
            "not logged in (run `gapakerem login`)"
        }
    );

    Ok(())
}
