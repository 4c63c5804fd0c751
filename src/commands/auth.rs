//! Sign-in commands.
//!
//! - `login`: exchange credentials for a session
//! - `logout`: clear the stored session
//! - `whoami`: show the signed-in user

use std::io::{self, BufRead, Write};

use owo_colors::OwoColorize;
use serde_json::json;

use super::{AppContext, CommandOutput};
use crate::cli::OutputOptions;
use crate::error::{MailboardError, Result};
use crate::utils::validation::validate_email;

/// Read the password from stdin when it was not passed as a flag.
fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(MailboardError::InvalidInput(
            "a password is required".to_string(),
        ));
    }
    Ok(password)
}

pub async fn cmd_login(email: &str, password: Option<String>, output: OutputOptions) -> Result<()> {
    validate_email(email)?;
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };

    let ctx = AppContext::load()?;
    let user = ctx.client()?.login(email.trim(), &password).await?;

    CommandOutput::new(json!({ "user": user }))
        .with_text(format!(
            "{} Signed in as {}",
            "✓".green(),
            user.display_name().bold()
        ))
        .print(output)
}

pub fn cmd_logout(output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let was_signed_in = ctx.session.is_authenticated();
    ctx.session.sign_out()?;

    let text = if was_signed_in {
        "Signed out".to_string()
    } else {
        "Not signed in".dimmed().to_string()
    };
    CommandOutput::new(json!({ "signed_out": was_signed_in }))
        .with_text(text)
        .print(output)
}

pub fn cmd_whoami(output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.session.user().ok_or(MailboardError::NotSignedIn)?;

    CommandOutput::new(json!({ "user": user }))
        .with_text(format!("{} <{}>", user.display_name().bold(), user.email))
        .print(output)
}
