//! Unit tests for CLI commands

use crate::cli::{format_route_table, Cli, Commands};
use crate::router::{GroupOptions, RouteRegistrar};
use clap::Parser;

#[test]
fn test_serve_command_with_addr() {
    let cli = Cli::try_parse_from(["routeshim", "serve", "--addr", "127.0.0.1:9000"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Serve {
            addr: Some("127.0.0.1:9000".into())
        }
    );
}

#[test]
fn test_global_config_flags() {
    let cli = Cli::try_parse_from([
        "routeshim",
        "routes",
        "--config",
        "other.yaml",
        "--env-file",
        "prod.env",
    ])
    .unwrap();
    assert_eq!(cli.command, Commands::Routes);
    assert_eq!(cli.config.to_string_lossy(), "other.yaml");
    assert_eq!(cli.env_file.to_string_lossy(), "prod.env");
}

#[test]
fn test_unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["routeshim", "generate"]).is_err());
}

#[test]
fn test_format_route_table() {
    let mut r = RouteRegistrar::new();
    r.get("/", ("HomeController", "index"));
    r.group(GroupOptions::prefix("/admin").middleware(["auth", "admin"]), |r| {
        r.get("/settings", ("AdminController", "settings"));
    });
    let table = format_route_table(&r.build().unwrap());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("GET"));
    assert!(lines[0].contains("HomeController@index"));
    assert!(lines[0].trim_end().ends_with('-'));
    assert!(lines[1].contains("/admin/settings"));
    assert!(lines[1].ends_with("auth,admin"));
}
