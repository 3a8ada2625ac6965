use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("idlewatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inactivity auto-logout and refresh coordination for authenticated sessions")
        .long_about("idlewatch mounts a session lifecycle (inactivity warning and logout, session refresh when a hidden view returns, debounced data-source refetching) and drives it from commands read on stdin. It also manages file-backed session tokens.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Mount a lifecycle and drive it from stdin commands")
                .long_about(
                    "Mounts a lifecycle and reads one command per line from stdin:\n\n\
                    activity [KIND]   record an interaction (pointer-down, pointer-move, key-press, scroll, touch-start, click)\n\
                    hide | show       document visibility change\n\
                    blur | focus      window focus change\n\
                    extend            extend the session (dismisses a warning)\n\
                    refresh           request a dashboard refetch\n\
                    route PATH        navigate to another route\n\
                    wait MS           pause reading input for MS milliseconds\n\
                    logout            log out now\n\
                    status            print the current snapshot\n\
                    quit              unmount and exit\n\n\
                    Lifecycle events are printed to stdout as JSON lines. The command exits\n\
                    when the session is logged out, on 'quit', or at end of input."
                )
                .arg(
                    Arg::new("session-file")
                        .long("session-file")
                        .short('f')
                        .help("JSON session file to watch (default: in-memory session)")
                        .value_parser(value_parser!(PathBuf))
                )
                .arg(
                    Arg::new("route")
                        .long("route")
                        .short('r')
                        .help("Route the view is mounted on")
                        .default_value("/dashboard")
                )
                .arg(
                    Arg::new("inactivity-minutes")
                        .long("inactivity-minutes")
                        .help("Minutes without activity before logout (overrides config)")
                        .value_parser(value_parser!(u64))
                )
                .arg(
                    Arg::new("warning-minutes")
                        .long("warning-minutes")
                        .help("Minutes before logout at which the warning is shown (overrides config)")
                        .value_parser(value_parser!(u64))
                )
                .arg(
                    Arg::new("ttl-minutes")
                        .long("ttl-minutes")
                        .help("Lifetime of the in-memory session and of each refresh")
                        .value_parser(value_parser!(u64))
                        .default_value("60")
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .short('s')
                        .help("Data source as NAME=COMMAND; the command is run through 'sh -c' on every refetch")
                        .action(ArgAction::Append)
                )
                .arg(
                    Arg::new("no-initial-load")
                        .long("no-initial-load")
                        .help("Skip fetching all sources at mount")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("session")
                .about("Manage a file-backed session token")
                .subcommand_required(true)
                .subcommand(
                    Command::new("write")
                        .about("Write a session file")
                        .arg(session_file_arg())
                        .arg(
                            Arg::new("token")
                                .long("token")
                                .short('t')
                                .help("Session token")
                                .required(true)
                        )
                        .arg(
                            Arg::new("ttl-minutes")
                                .long("ttl-minutes")
                                .help("Minutes until the session expires")
                                .value_parser(value_parser!(u64))
                                .default_value("60")
                        )
                )
                .subcommand(
                    Command::new("status")
                        .about("Show whether a session file holds a valid session")
                        .arg(session_file_arg())
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .help("Output in JSON format")
                                .action(ArgAction::SetTrue)
                        )
                )
                .subcommand(
                    Command::new("clear")
                        .about("Remove a session file")
                        .arg(session_file_arg())
                )
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
}

fn session_file_arg() -> Arg {
    Arg::new("file")
        .long("file")
        .short('f')
        .help("Path of the session file")
        .value_parser(value_parser!(PathBuf))
        .required(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "idlewatch");
        app.debug_assert();
    }

    #[test]
    fn test_cli_watch_defaults() {
        let matches = build_cli()
            .try_get_matches_from(vec!["idlewatch", "watch"])
            .unwrap();
        let watch = matches.subcommand_matches("watch").unwrap();

        assert_eq!(watch.get_one::<String>("route").unwrap(), "/dashboard");
        assert_eq!(*watch.get_one::<u64>("ttl-minutes").unwrap(), 60);
        assert!(watch.get_one::<PathBuf>("session-file").is_none());
        assert!(watch.get_many::<String>("source").is_none());
        assert!(!watch.get_flag("no-initial-load"));
    }

    #[test]
    fn test_cli_watch_overrides() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "idlewatch",
                "watch",
                "--session-file",
                "/tmp/session.json",
                "--route",
                "/reports",
                "--inactivity-minutes",
                "10",
                "--warning-minutes",
                "2",
                "--source",
                "stats=true",
                "-s",
                "chart=echo hi",
            ])
            .unwrap();
        let watch = matches.subcommand_matches("watch").unwrap();

        assert_eq!(
            watch.get_one::<PathBuf>("session-file").unwrap(),
            &PathBuf::from("/tmp/session.json")
        );
        assert_eq!(watch.get_one::<String>("route").unwrap(), "/reports");
        assert_eq!(*watch.get_one::<u64>("inactivity-minutes").unwrap(), 10);
        assert_eq!(*watch.get_one::<u64>("warning-minutes").unwrap(), 2);
        let sources: Vec<&String> = watch.get_many::<String>("source").unwrap().collect();
        assert_eq!(sources, vec!["stats=true", "chart=echo hi"]);
    }

    #[test]
    fn test_cli_watch_rejects_non_numeric_timeout() {
        let result =
            build_cli().try_get_matches_from(vec!["idlewatch", "watch", "--inactivity-minutes", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_session_write_requires_token() {
        let result = build_cli().try_get_matches_from(vec![
            "idlewatch",
            "session",
            "write",
            "--file",
            "s.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_session_status_json() {
        let matches = build_cli()
            .try_get_matches_from(vec!["idlewatch", "session", "status", "-f", "s.json", "--json"])
            .unwrap();
        let (name, session) = matches.subcommand().unwrap();
        assert_eq!(name, "session");
        let status = session.subcommand_matches("status").unwrap();
        assert!(status.get_flag("json"));
    }

    #[test]
    fn test_cli_verbose_flag_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(vec!["idlewatch", "config", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_cli_verbose_flag_default_false() {
        let matches = build_cli()
            .try_get_matches_from(vec!["idlewatch", "config"])
            .unwrap();
        assert!(!matches.get_flag("verbose"));
    }
}
