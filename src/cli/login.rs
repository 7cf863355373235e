use std::io::{self, BufRead, Write};

use colored::Colorize;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};
use crate::settings::load_settings;

fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn login(username: Option<String>) -> Result<()> {
    let settings = load_settings();
    let client = super::client(&settings)?;

    let username = match username {
        Some(u) => u,
        None => prompt_line("Username: ")?,
    };
    if username.is_empty() {
        return Err(AppError::Other("Username is required".into()));
    }
    let password = Zeroizing::new(rpassword::prompt_password("Password: ")?);
    if password.is_empty() {
        return Err(AppError::Other("Password is required".into()));
    }

    client.login(&username, &password)?;
    println!("{} Logged in to {}", "\u{2713}".green(), client.base_url());
    Ok(())
}

pub fn logout() -> Result<()> {
    let settings = load_settings();
    super::client(&settings)?.logout()?;
    println!("Logged out.");
    Ok(())
}
