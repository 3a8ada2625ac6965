use std::path::PathBuf;

use chrono::Utc;
use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info};

use idlewatch_core::events;
use idlewatch_core::session::{
    Session, SessionHealth, load_session_file, remove_session_file, save_session_file,
};

use super::helpers::{load_config_with_warning, minutes};

#[derive(Serialize)]
struct SessionStatus {
    file: String,
    present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<SessionHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds_remaining: Option<i64>,
}

pub(crate) fn handle_session_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("write", sub_matches)) => handle_write(sub_matches),
        Some(("status", sub_matches)) => handle_status(sub_matches),
        Some(("clear", sub_matches)) => handle_clear(sub_matches),
        _ => {
            error!(event = "cli.session.command_unknown");
            Err("Unknown session command".into())
        }
    }
}

fn session_file(matches: &ArgMatches) -> Result<&PathBuf, Box<dyn std::error::Error>> {
    Ok(matches
        .get_one::<PathBuf>("file")
        .ok_or("File argument is required")?)
}

fn handle_write(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = session_file(matches)?;
    let token = matches
        .get_one::<String>("token")
        .ok_or("Token argument is required")?;
    let ttl_minutes = matches.get_one::<u64>("ttl-minutes").copied().unwrap_or(60);

    if token.trim().is_empty() {
        eprintln!("Token must not be empty");
        return Err("Token must not be empty".into());
    }

    info!(
        event = "cli.session.write_started",
        path = %path.display(),
        ttl_minutes = ttl_minutes
    );

    let session = Session::with_ttl(token.as_str(), Utc::now(), minutes(ttl_minutes));
    match save_session_file(path, &session) {
        Ok(()) => {
            println!("Session written to {}", path.display());
            if let Some(expires_at) = session.expires_at() {
                println!("   Expires: {}", expires_at.to_rfc3339());
            }
            info!(event = "cli.session.write_completed", path = %path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to write session file: {}", e);
            error!(event = "cli.session.write_failed", path = %path.display(), error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

fn handle_status(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = session_file(matches)?;
    let json_output = matches.get_flag("json");

    info!(event = "cli.session.status_started", path = %path.display());

    let margin = load_config_with_warning().logout.expiry_margin();
    let session = match load_session_file(path) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to read session file: {}", e);
            error!(event = "cli.session.status_failed", path = %path.display(), error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    let now = Utc::now();
    let status = SessionStatus {
        file: path.display().to_string(),
        present: session.is_some(),
        health: session.as_ref().map(|s| s.health(now, margin)),
        expires_at: session.as_ref().map(|s| s.expires_at),
        seconds_remaining: session.as_ref().map(|s| s.seconds_until_expiry(now)),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match (&session, status.health) {
            (Some(session), Some(health)) => {
                println!("Session: {}", health);
                if let Some(expires_at) = session.expires_at() {
                    println!("   Expires: {}", expires_at.to_rfc3339());
                }
                println!("   Remaining: {}s", session.seconds_until_expiry(now));
            }
            _ => println!("No session at {}", path.display()),
        }
    }

    info!(
        event = "cli.session.status_completed",
        present = status.present,
        health = ?status.health
    );
    Ok(())
}

fn handle_clear(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = session_file(matches)?;

    info!(event = "cli.session.clear_started", path = %path.display());

    match remove_session_file(path) {
        Ok(true) => {
            println!("Session cleared: {}", path.display());
            info!(event = "cli.session.clear_completed", removed = true);
            Ok(())
        }
        Ok(false) => {
            println!("No session at {}", path.display());
            info!(event = "cli.session.clear_completed", removed = false);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to clear session: {}", e);
            error!(event = "cli.session.clear_failed", path = %path.display(), error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}
