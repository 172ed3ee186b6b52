//! Argument parsing for the CLI surface.

use clangd_query::cli::{Cli, Command};
use clap::Parser;

#[test]
fn search_command_carries_its_query_and_limit() {
    let cli = Cli::parse_from(["clangd-query", "search", "GameObject", "--limit", "5"]);
    assert_eq!(cli.limit, Some(5));
    let (name, args) = cli.command.as_request_parts().unwrap();
    assert_eq!(name, "search");
    assert_eq!(args, vec!["GameObject".to_string()]);
}

#[test]
fn verbose_and_timeout_flags_are_global() {
    let cli = Cli::parse_from(["clangd-query", "--verbose", "--timeout", "10", "status"]);
    assert!(cli.verbose);
    assert_eq!(cli.timeout, Some(10));
    let (name, args) = cli.command.as_request_parts().unwrap();
    assert_eq!(name, "status");
    assert!(args.is_empty());
}

#[test]
fn daemon_command_is_not_a_wire_request() {
    let cli = Cli::parse_from(["clangd-query", "daemon", "/tmp/project"]);
    assert!(cli.command.as_request_parts().is_none());
    match cli.command {
        Command::Daemon { project_root } => {
            assert_eq!(project_root, std::path::PathBuf::from("/tmp/project"));
        }
        _ => panic!("expected the daemon command"),
    }
}

#[test]
fn usages_accepts_a_file_line_col_argument() {
    let cli = Cli::parse_from(["clangd-query", "usages", "src/transform.cpp:40:10"]);
    let (name, args) = cli.command.as_request_parts().unwrap();
    assert_eq!(name, "usages");
    assert_eq!(args, vec!["src/transform.cpp:40:10".to_string()]);
}
