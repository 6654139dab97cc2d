//! Console output for the operator

use colored::*;
use terminal_size::{terminal_size, Height, Width};

pub fn print_header(subtitle: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let line = "─".repeat(usize::from(width.0).min(100));
    println!("{}", line.black().bold());

    let name = "merchant-auth".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);
    println!("  {}", subtitle.cyan());

    println!("{}", line.black().bold());
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "!".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "✗".red().bold(), msg.red());
}

/// Prompts the operator has to act on go to stderr; stdout carries command
/// output only (`merchant-auth token`)
pub fn print_prompt(msg: &str) {
    eprintln!("  {} {}", "•".green(), msg);
}

pub fn print_prompt_warning(msg: &str) {
    eprintln!("  {} {}", "!".yellow().bold(), msg.yellow());
}

pub fn print_waiting(msg: &str) {
    eprintln!("  {} {}", "∴".magenta(), msg);
}

/// `path` followed by whether it exists, for status listings
pub fn print_file(label: &str, path: &std::path::Path) {
    let marker = if path.is_file() { "found".green() } else { "missing".black().bold() };
    println!("  {:<16} {} ({})", label, path.display(), marker);
}
