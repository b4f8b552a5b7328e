use colored::*;

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(e.exit_status().code());
    }
}
