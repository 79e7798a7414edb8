//! # stagehand CLI Entry Point
//!
//! Provisions every declared dependency under `$BASE_DIRECTORY/external`.
//! Takes no arguments; the exit status is non-zero if any dependency fails.

use anyhow::Result;
use clap::Parser;
use colored::*;

use stagehand::catalog;
use stagehand::config::{self, Settings};
use stagehand::driver::Provisioner;
use stagehand::native::CMake;
use stagehand::ui;
use stagehand::vcs::Git;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Fetch, filter and stage third-party C/C++ dependencies", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    if let Err(err) = run() {
        eprintln!("{} {:#}", "x".red(), err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = Settings::from_env();
    let dependencies = match config::load_manifest(&settings)? {
        Some(deps) => {
            println!(
                "{} Using {}",
                "📄".blue(),
                settings.manifest_path().display()
            );
            deps
        }
        None => catalog::default_dependencies(),
    };

    let layout = settings.layout();
    println!(
        "{} Provisioning {} dependencies into {}",
        "🚀".cyan(),
        dependencies.len(),
        layout.install_root.display()
    );

    let git = Git;
    let cmake = CMake::new(&settings.cmake_program);
    let report = Provisioner::new(layout, &git, &cmake).run(&dependencies)?;

    println!();
    ui::print_report(&report);
    println!(
        "{} Done ({} fetched, {} up to date)",
        "✓".green(),
        report.entries.len() - report.cache_hits(),
        report.cache_hits()
    );
    Ok(())
}
