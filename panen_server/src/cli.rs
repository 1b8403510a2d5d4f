use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty. Returns true if any argument was given, in which
/// case the help text has been printed and the server should not start.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "PANEN_HOST",
        "PANEN_PORT",
        "PANEN_DATABASE_URL",
        "PANEN_DB_MAX_CONNECTIONS",
        "PANEN_DB_ACQUIRE_TIMEOUT",
        "PANEN_SETTLEMENT_INTERVAL",
        "PANEN_AUTO_MIGRATE",
        "PANEN_SKIP_PREFLIGHT",
        "PANEN_AUTH_URL",
        "PANEN_NOTIFICATION_URL",
        "TRIPAY_API_URL",
        "TRIPAY_TIMEOUT",
        "TRIPAY_EXPIRY_HOURS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
