use clap::Parser;
use quiver::cli::{Cli, Commands};

#[test]
fn test_add_with_separator() {
    let cli = Cli::parse_from([
        "quiver", "add", "-n", "ssh-host", "-d", "connect", "--", "ssh", "{{.user}}@{{.host}}",
    ]);

    match cli.command {
        Commands::Add {
            name,
            description,
            command,
        } => {
            assert_eq!(name, "ssh-host");
            assert_eq!(description, "connect");
            assert_eq!(command, vec!["ssh", "{{.user}}@{{.host}}"]);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn test_add_requires_name() {
    assert!(Cli::try_parse_from(["quiver", "add", "--", "ls"]).is_err());
}

#[test]
fn test_search_requires_query() {
    assert!(Cli::try_parse_from(["quiver", "search"]).is_err());

    let cli = Cli::parse_from(["quiver", "search", "docker"]);
    match cli.command {
        Commands::Search { query } => assert_eq!(query, "docker"),
        _ => panic!("expected search command"),
    }
}

#[test]
fn test_exec_args_and_dry_run() {
    let cli = Cli::parse_from([
        "quiver", "exec", "some-id", "-a", "host=web1", "--arg", "user=admin", "--dry-run",
    ]);

    match cli.command {
        Commands::Exec { id, args, dry_run } => {
            assert_eq!(id, "some-id");
            assert_eq!(args, vec!["host=web1", "user=admin"]);
            assert!(dry_run);
        }
        _ => panic!("expected exec command"),
    }
}

#[test]
fn test_edit_partial_flags() {
    let cli = Cli::parse_from(["quiver", "edit", "some-id", "--name", "renamed"]);

    match cli.command {
        Commands::Edit {
            id,
            name,
            description,
            command,
        } => {
            assert_eq!(id, "some-id");
            assert_eq!(name.as_deref(), Some("renamed"));
            assert!(description.is_none());
            assert!(command.is_none());
        }
        _ => panic!("expected edit command"),
    }
}

#[test]
fn test_explain_refresh_flag() {
    let cli = Cli::parse_from(["quiver", "explain", "some-id", "--refresh"]);
    match cli.command {
        Commands::Explain { id, refresh } => {
            assert_eq!(id, "some-id");
            assert!(refresh);
        }
        _ => panic!("expected explain command"),
    }
}
