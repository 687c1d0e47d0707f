use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // API keys and the admin token are left out on purpose
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "MSP_HOST",
        "MSP_PORT",
        "MSP_DATABASE_URL",
        "MSP_ACCOUNT_TYPE",
        "MSP_SECONDS_ACTIVE",
        "MSP_TIMEOUT",
        "MSP_USE_X_FORWARDED_FOR",
        "MSP_USE_FORWARDED",
        "MSP_LOCALE",
        "MSP_SITE_URL",
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
