use std::path::Path;

use summio_config::AppConfig;

/// Print the startup banner with a summary of the effective config.
pub fn print_banner(config: &AppConfig) {
    let version = env!("CARGO_PKG_VERSION");

    let url = format!("http://{}", display_address(&config.server.address));
    let db = tilde(&config.storage.db_path);
    let files = tilde(&config.storage.files_dir);
    let mode = if config.server.debug { "debug" } else { "release" };

    // Layout
    let width = 70;
    let left_w = 25;
    let right_w = width - left_w - 3; // 3 for "│ " + "│"

    let title = format!("Summio v{version}");
    let title_dashes = width - 2 - title.len() - 5; // 2 for ╭╮, 5 for "─── " + " "
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let row = |l: &str, r: &str| format!("│ {:<left_w$}│  {:<right_w$}│", l, r);

    println!("{top}");
    println!("{}", row("", ""));
    println!("{}", row("  PDF summaries", "Gateway"));
    println!("{}", row("", &url));
    println!("{}", row("    .-------.", &"─".repeat(right_w - 2)));
    println!("{}", row("    | %PDF- |", &format!("Model     {}", config.llm.model)));
    println!("{}", row("    | ~~~~~ |", &format!("Database  {db}")));
    println!("{}", row("    '-------'", &format!("Files     {files}")));
    println!("{}", row("", &format!("Mode      {mode}")));
    println!("{}", row("", "Press Ctrl+C to stop"));
    println!("{}", row("", ""));
    println!("{bottom}");
}

fn display_address(address: &str) -> String {
    match address.strip_prefix(':') {
        Some(port) => format!("localhost:{port}"),
        None => address.to_string(),
    }
}

fn tilde(path: &Path) -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => path.to_string_lossy().replace(&home, "~"),
        _ => path.to_string_lossy().to_string(),
    }
}
