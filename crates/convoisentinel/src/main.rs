//! `convoi` - CLI for convoisentinel
//!
//! Reports road obstacles, lists emergency contacts and manages the theme
//! preference from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

use convoisentinel::cli::{Cli, Command, ConfigCommand, ObstacleCommand, ThemeCommand};
use convoisentinel::obstacle::{Obstacle, ObstacleForm};
use convoisentinel::contacts::{listing, ContactListing};
use convoisentinel::{init_logging, App, Backend, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // These two look at a config file, so they must not depend on loading one.
    let config_path = cli.config_path();
    match cli.command {
        Command::Config(ConfigCommand::Path) => {
            println!("{}", config_path.display());
            return Ok(());
        }
        Command::Config(ConfigCommand::Validate { file }) => {
            return validate_config(&file.unwrap_or(config_path));
        }
        _ => {}
    }

    let mut config = Config::load_from(Some(config_path))?;
    if let Some(appearance) = cli.appearance {
        config.theme.host_appearance = appearance.into();
    }

    match cli.command {
        Command::Contacts(cmd) => handle_contacts(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
        command => {
            let backend = if cli.memory {
                Backend::Memory
            } else {
                Backend::from_config(&config)
            };
            let app = App::start(config, backend)
                .await
                .context("failed to open storage")?;

            let result = match command {
                Command::Obstacle(cmd) => handle_obstacle(&app, cmd).await,
                Command::Theme(cmd) => handle_theme(&app, cmd).await,
                Command::Status(cmd) => handle_status(&app, cmd.json).await,
                Command::Contacts(_) | Command::Config(_) => Ok(()),
            };
            app.shutdown();
            result
        }
    }
}

async fn handle_obstacle(app: &App, cmd: ObstacleCommand) -> anyhow::Result<()> {
    let store = app.obstacles();
    match cmd {
        ObstacleCommand::List { json } => {
            let obstacles = store.get_all().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&obstacles)?);
            } else if obstacles.is_empty() {
                println!("No obstacles reported.");
            } else {
                for obstacle in &obstacles {
                    print_summary(obstacle);
                }
            }
        }
        ObstacleCommand::Add(args) => {
            let fields = ObstacleForm::from(args).validate()?;
            let obstacle = store.add(fields).await.context("failed to save obstacle")?;
            println!("Added obstacle {}", obstacle.id);
        }
        ObstacleCommand::Show { id, json } => {
            let Some(obstacle) = store.get(&id).await else {
                bail!("no obstacle with id '{id}'");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&obstacle)?);
            } else {
                print_details(&obstacle);
            }
        }
        ObstacleCommand::Remove { id } => {
            store
                .remove(&id)
                .await
                .context("failed to remove obstacle")?;
            println!("Removed obstacle {id}");
        }
        ObstacleCommand::Clear { yes } => {
            if yes {
                store.clear().await.context("failed to clear obstacles")?;
                println!("All obstacles removed.");
            } else {
                println!("This will remove every reported obstacle.");
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

fn print_summary(obstacle: &Obstacle) {
    let when = obstacle
        .created_at_utc()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let place = obstacle
        .coordinates()
        .map(|(lat, lon)| format!("{lat:.5}, {lon:.5}"))
        .unwrap_or_else(|| "-".to_string());
    println!("{:<22} {:<16} {:<24} {}", obstacle.id, when, place, obstacle.title);
}

fn print_details(obstacle: &Obstacle) {
    println!("Id:          {}", obstacle.id);
    println!("Title:       {}", obstacle.title);
    if !obstacle.description.is_empty() {
        println!("Description: {}", obstacle.description);
    }
    if let Some(lat) = obstacle.latitude {
        println!("Latitude:    {lat}");
    }
    if let Some(lon) = obstacle.longitude {
        println!("Longitude:   {lon}");
    }
    if let Some(photo) = &obstacle.photo_uri {
        println!("Photo:       {photo}");
    }
    if let Some(created) = obstacle.created_at_utc() {
        println!("Reported:    {}", created.to_rfc3339());
    }
}

async fn handle_theme(app: &App, cmd: ThemeCommand) -> anyhow::Result<()> {
    let theme = app.theme();
    match cmd {
        ThemeCommand::Show { json } => {
            let state = theme.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("Preference: {}", state.preference);
                println!("Scheme:     {}", state.scheme);
            }
        }
        ThemeCommand::Set { preference } => {
            // The command exits right after, so wait for the write.
            theme.set_preference(preference.into()).await?;
            println!(
                "Theme set to {} (scheme: {})",
                theme.preference(),
                theme.scheme()
            );
        }
    }
    Ok(())
}

async fn handle_status(app: &App, json: bool) -> anyhow::Result<()> {
    let status = app.status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("convoi status");
    println!("-------------");
    println!("Backend:    {}", status.backend);
    if let Some(path) = &status.database_path {
        println!("Database:   {}", path.display());
    }
    if let Some(size) = status.db_size_bytes {
        println!("Size:       {size} bytes");
    }
    if let Some(last) = status.last_write {
        println!("Last write: {}", last.to_rfc3339());
    }
    if let Some(keys) = &status.keys {
        println!("Keys:       {}", keys.join(", "));
    }
    println!("Obstacles:  {}", status.obstacle_count);
    println!(
        "Theme:      {} ({})",
        status.theme.preference, status.theme.scheme
    );
    Ok(())
}

fn handle_contacts(config: &Config, json: bool) -> anyhow::Result<()> {
    let entries = listing(&config.contacts);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for ContactListing { contact, callable } in &entries {
        match (&contact.phone, callable) {
            (Some(phone), true) => println!("{:<24} {phone}", contact.name),
            _ => println!("{:<24} - (not callable)", contact.name),
        }
        if let Some(role) = &contact.role {
            println!("    {role}");
        }
        if let Some(note) = &contact.note {
            println!("    {note}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!("  Obstacles key:   {}", config.storage.obstacles_key);
                println!("  Theme key:       {}", config.storage.theme_key);
                println!();
                println!("[Obstacles]");
                println!("  Default title:   {}", config.obstacles.default_title);
                println!();
                println!("[Theme]");
                println!("  Host appearance: {}", config.theme.host_appearance);
                println!();
                println!("[Contacts]");
                println!("  Entries:         {}", config.contacts.len());
            }
        }
        // Answered before any configuration is loaded.
        ConfigCommand::Path | ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}

fn validate_config(path: &Path) -> anyhow::Result<()> {
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => bail!("configuration error: {e}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_checks_given_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        let bad = dir.path().join("bad.toml");
        std::fs::write(&good, "[obstacles]\ndefault_title = \"Danger\"\n").unwrap();
        std::fs::write(&bad, "[obstacles]\ndefault_title = \"  \"\n").unwrap();

        assert!(validate_config(&good).is_ok());
        let err = validate_config(&bad).unwrap_err().to_string();
        assert!(err.contains("configuration error"));
    }

    #[test]
    fn test_validate_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config(&dir.path().join("absent.toml")).is_ok());
    }
}
