use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use idlewatch_core::config::IdlewatchConfig;
use idlewatch_core::events;
use idlewatch_core::lifecycle::{
    LifecycleBuilder, LifecycleConfig, LifecycleEvent, LifecycleHandle, LifecycleHooks,
    LifecycleInput, LifecycleSnapshot,
};
use idlewatch_core::logout::LogoutReason;
use idlewatch_core::session::{FileSessionStore, MemorySessionStore, SessionStore};
use idlewatch_core::{InteractionKind, VisibilitySignal};

use super::helpers::{load_config_with_warning, minutes};
use crate::source::CommandSource;

/// One line of stdin, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchCommand {
    Input(LifecycleInput),
    Wait(Duration),
    Status,
    Quit,
}

impl FromStr for WatchCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or("empty command")?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", verb));
        }

        let command = match (verb, arg) {
            ("activity", kind) => {
                let kind = kind
                    .map(InteractionKind::from_str)
                    .transpose()?
                    .unwrap_or(InteractionKind::Click);
                WatchCommand::Input(LifecycleInput::Activity(kind))
            }
            ("hide" | "show" | "blur" | "focus", None) => {
                WatchCommand::Input(LifecycleInput::Visibility(verb.parse::<VisibilitySignal>()?))
            }
            ("extend", None) => WatchCommand::Input(LifecycleInput::ExtendSession),
            ("refresh", None) => WatchCommand::Input(LifecycleInput::RefreshDashboard),
            ("logout", None) => WatchCommand::Input(LifecycleInput::LogoutNow),
            ("route", Some(path)) if path.starts_with('/') => {
                WatchCommand::Input(LifecycleInput::Navigate(path.to_string()))
            }
            ("route", _) => return Err("route expects an absolute PATH like /dashboard".to_string()),
            ("wait", Some(ms)) => {
                let ms = ms
                    .parse::<u64>()
                    .map_err(|_| format!("wait expects milliseconds, got '{}'", ms))?;
                WatchCommand::Wait(Duration::from_millis(ms))
            }
            ("wait", None) => return Err("wait expects milliseconds".to_string()),
            ("status", None) => WatchCommand::Status,
            ("quit" | "exit", None) => WatchCommand::Quit,
            (
                "hide" | "show" | "blur" | "focus" | "extend" | "refresh" | "logout" | "status"
                | "quit" | "exit",
                Some(_),
            ) => return Err(format!("'{}' takes no argument", verb)),
            (other, _) => return Err(format!("unknown command '{}'", other)),
        };

        Ok(command)
    }
}

#[derive(Serialize)]
struct StatusLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    snapshot: &'a LifecycleSnapshot,
}

/// How the stdin loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    InputClosed,
    Quit,
    ShellStopped,
}

/// Surfaces the warning and logout prompts on stderr.
struct TerminalHooks;

impl LifecycleHooks for TerminalHooks {
    fn on_warning(&self, logout_in: Duration) {
        eprintln!(
            "Session ends in {}s without activity. Send 'extend' to stay signed in.",
            logout_in.as_secs()
        );
    }

    fn on_logout(&self, reason: LogoutReason) {
        eprintln!("Signed out ({}).", reason);
    }
}

pub(crate) fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let route = matches
        .get_one::<String>("route")
        .cloned()
        .unwrap_or_else(|| "/dashboard".to_string());
    let ttl = minutes(matches.get_one::<u64>("ttl-minutes").copied().unwrap_or(60));
    let session_file = matches.get_one::<PathBuf>("session-file").cloned();
    let initial_load = !matches.get_flag("no-initial-load");

    let mut config = load_config_with_warning();
    apply_overrides(&mut config, matches);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        error!(event = "cli.watch_failed", error = %e);
        events::log_app_error(&e);
        return Err(e.into());
    }

    let sources = matches
        .get_many::<String>("source")
        .into_iter()
        .flatten()
        .map(|arg| CommandSource::parse(arg))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            eprintln!("Invalid --source: {}", e);
            error!(event = "cli.watch_failed", error = %e);
            e
        })?;

    let store: Arc<dyn SessionStore> = match &session_file {
        Some(path) => Arc::new(FileSessionStore::new(path.clone())),
        None => Arc::new(MemorySessionStore::with_token("cli", ttl)),
    };

    info!(
        event = "cli.watch_started",
        route = %route,
        session_file = ?session_file,
        sources = sources.len(),
        inactivity_minutes = config.logout.inactivity_timeout_minutes(),
        warning_minutes = config.logout.warning_time_minutes()
    );

    let mut builder = LifecycleBuilder::new(store)
        .config(LifecycleConfig::from_config(&config))
        .hooks(Arc::new(TerminalHooks))
        .route(route)
        .initial_load(initial_load);
    for source in sources {
        builder = builder.source(Arc::new(source));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // mount spawns onto the runtime, so it has to run inside it
    let ending = runtime.block_on(async move { drive(builder.mount()).await });
    // A blocked stdin read would otherwise hold up shutdown after `quit` or logout
    runtime.shutdown_background();
    let ending = ending?;

    info!(event = "cli.watch_completed", ending = ?ending);
    events::log_app_shutdown("cli");
    Ok(())
}

fn apply_overrides(config: &mut IdlewatchConfig, matches: &ArgMatches) {
    if let Some(inactivity) = matches.get_one::<u64>("inactivity-minutes") {
        config.logout.inactivity_timeout_minutes = Some(*inactivity);
    }
    if let Some(warning) = matches.get_one::<u64>("warning-minutes") {
        config.logout.warning_time_minutes = Some(*warning);
    }
}

/// Feed stdin commands to the shell until input ends, `quit`, or logout.
async fn drive(mut handle: LifecycleHandle) -> Result<Ending, Box<dyn std::error::Error>> {
    let mut receiver = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = "cli.watch.events_lagged", skipped = skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ending = loop {
        tokio::select! {
            biased;
            result = handle.stopped() => {
                result?;
                break Ending::ShellStopped;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break Ending::InputClosed;
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                match line.parse::<WatchCommand>() {
                    Ok(WatchCommand::Input(input)) => {
                        if let Err(e) = handle.send(input) {
                            debug!(event = "cli.watch.input_dropped", error = %e);
                        }
                    }
                    Ok(WatchCommand::Wait(duration)) => tokio::time::sleep(duration).await,
                    Ok(WatchCommand::Status) => print_status(&handle.snapshot()),
                    Ok(WatchCommand::Quit) => break Ending::Quit,
                    Err(e) => {
                        eprintln!("Ignoring '{}': {}", line, e);
                        warn!(event = "cli.watch.input_rejected", line = line, error = %e);
                    }
                }
            }
        }
    };

    match ending {
        Ending::InputClosed => handle.close().await?,
        Ending::Quit | Ending::ShellStopped => handle.unmount().await?,
    }
    printer.await?;

    Ok(ending)
}

fn print_event(event: &LifecycleEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!(event = "cli.watch.serialize_failed", error = %e),
    }
}

fn print_status(snapshot: &LifecycleSnapshot) {
    let line = StatusLine {
        event: "status",
        snapshot,
    };
    match serde_json::to_string(&line) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!(event = "cli.watch.serialize_failed", error = %e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<WatchCommand, String> {
        line.parse()
    }

    #[test]
    fn test_parse_activity_defaults_to_click() {
        assert_eq!(
            parse("activity").unwrap(),
            WatchCommand::Input(LifecycleInput::Activity(InteractionKind::Click))
        );
        assert_eq!(
            parse("activity key-press").unwrap(),
            WatchCommand::Input(LifecycleInput::Activity(InteractionKind::KeyPress))
        );
        assert!(parse("activity hover").is_err());
    }

    #[test]
    fn test_parse_visibility_signals() {
        assert_eq!(
            parse("hide").unwrap(),
            WatchCommand::Input(LifecycleInput::Visibility(VisibilitySignal::DocumentHidden))
        );
        assert_eq!(
            parse("focus").unwrap(),
            WatchCommand::Input(LifecycleInput::Visibility(VisibilitySignal::WindowFocus))
        );
        assert!(parse("hide now").is_err());
    }

    #[test]
    fn test_parse_route_requires_absolute_path() {
        assert_eq!(
            parse("route /reports").unwrap(),
            WatchCommand::Input(LifecycleInput::Navigate("/reports".to_string()))
        );
        assert!(parse("route reports").is_err());
        assert!(parse("route").is_err());
    }

    #[test]
    fn test_parse_wait() {
        assert_eq!(
            parse("wait 250").unwrap(),
            WatchCommand::Wait(Duration::from_millis(250))
        );
        assert!(parse("wait soon").is_err());
        assert!(parse("wait").is_err());
    }

    #[test]
    fn test_parse_control_commands() {
        assert_eq!(
            parse("logout").unwrap(),
            WatchCommand::Input(LifecycleInput::LogoutNow)
        );
        assert_eq!(
            parse("extend").unwrap(),
            WatchCommand::Input(LifecycleInput::ExtendSession)
        );
        assert_eq!(
            parse("refresh").unwrap(),
            WatchCommand::Input(LifecycleInput::RefreshDashboard)
        );
        assert_eq!(parse("status").unwrap(), WatchCommand::Status);
        assert_eq!(parse("quit").unwrap(), WatchCommand::Quit);
        assert_eq!(parse("exit").unwrap(), WatchCommand::Quit);
    }

    #[test]
    fn test_parse_rejects_unknown_and_extra_arguments() {
        assert!(parse("dance").is_err());
        assert!(parse("extend 5").is_err());
        assert!(parse("route /a /b").is_err());
    }

    #[test]
    fn test_status_line_flattens_snapshot() {
        let snapshot = LifecycleSnapshot {
            state: idlewatch_core::LogoutState::Tracking,
            route: "/dashboard".to_string(),
            is_visible: true,
            tracking_active: true,
            loading: false,
            loading_sources: vec!["chart".to_string()],
            idle_for_ms: 0,
            warning_in_ms: Some(1_500_000),
            logout_in_ms: Some(1_800_000),
            dashboard_refresh_pending: false,
        };
        let json = serde_json::to_value(StatusLine {
            event: "status",
            snapshot: &snapshot,
        })
        .unwrap();

        assert_eq!(json["event"], "status");
        assert_eq!(json["state"], "tracking");
        assert_eq!(json["route"], "/dashboard");
        assert_eq!(json["warning_in_ms"], 1_500_000);
        assert_eq!(json["loading_sources"], serde_json::json!(["chart"]));
    }
}
