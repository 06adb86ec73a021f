use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::Settings;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the resolved settings (API key masked).
    Show,
}

pub fn run(command: ConfigCommand, config_path: &Path) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(config_path),
    }
}

fn run_show(config_path: &Path) -> AppResult<()> {
    let settings = Settings::load(config_path)?;
    print!("{}", render_settings(&settings, config_path));
    Ok(())
}

fn render_settings(settings: &Settings, config_path: &Path) -> String {
    let mut lines = vec![
        format!(
            "Configuration file: {}{}",
            config_path.display(),
            if config_path.exists() { "" } else { " (not present)" }
        ),
        format!("Freshdesk domain: {}", display_value(&settings.freshdesk_domain)),
        format!("Freshdesk API key: {}", mask_secret(&settings.freshdesk_key)),
        format!(
            "Default custom field: {}",
            display_value(&settings.freshdesk_custom_field)
        ),
        format!(
            "Helpdesk base URL: {}",
            settings
                .helpdesk_base_url()
                .unwrap_or_else(|_| "<not set>".to_string())
        ),
    ];

    match &settings.repositories {
        Some(repositories) if !repositories.is_empty() => {
            lines.push("Repository fields:".to_string());
            let mut entries: Vec<_> = repositories.iter().collect();
            entries.sort();
            for (repo, field) in entries {
                lines.push(format!("  {repo} -> {field}"));
            }
        }
        _ => lines.push("Repository fields: <none>".to_string()),
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.len() > 6 && token.is_ascii() => {
            let prefix = &token[..3];
            let suffix = &token[token.len() - 3..];
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
