mod bridge;
mod cli;
mod config;
mod platform;
mod purge;
mod sandbox;
mod service;
mod usage;
mod utils;
mod walker;

use anyhow::Result;
use bridge::MethodChannel;
use cli::{Cli, Commands, ConfigActions, OutputFormat};
use config::Config;
use purge::PurgeOutcome;
use sandbox::SandboxLayout;
use service::{DiskSnapshot, StatsSnapshot, StorageReport, StorageService};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use utils::{format_size, percent};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    let result = match Config::load() {
        Ok(config) => run(cli, config),
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Logs go to stderr; stdout stays clean for command output and the
    // stdio transport of `serve`.
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let layout = SandboxLayout::resolve(&config.sandbox);
    let service = StorageService::with_host_platform(layout);

    match cli.command {
        Commands::Stats { format } => run_stats(&service, format)?,
        Commands::Disk { format } => run_disk(&service, format)?,
        Commands::Size { path } => run_size(&path),
        Commands::List { path } => run_list(&service, path.as_deref()),
        Commands::Delete { path, yes } => return Ok(run_delete(&service, &path, yes)),
        Commands::ClearCache { yes } => return Ok(run_clear_cache(&service, yes)),
        Commands::Home => println!("{}", service.home_directory().display()),
        Commands::Config { action } => run_config(action, config)?,
        Commands::Serve => {
            tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?
                .block_on(bridge::run_bridge_server(MethodChannel::new(service)))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_stats(service: &StorageService, format: OutputFormat) -> Result<()> {
    let per_category = service.category_usage();

    match format {
        OutputFormat::Json => {
            let report = StorageReport::from_usage(&per_category);
            let skipped = per_category.iter().map(|(_, u)| u.skipped).sum();
            let snapshot = StatsSnapshot::new(report, skipped);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Human => {
            for (category, usage) in &per_category {
                println!("{}:", category);
                println!(
                    "  Path: {}",
                    service.layout().category_root(*category).display()
                );
                println!("  Files: {}", usage.files);
                println!("  Size: {}", format_size(usage.bytes));
                if usage.skipped > 0 {
                    println!("  Skipped: {} unreadable entries", usage.skipped);
                }
                println!();
            }

            let total: u64 = per_category.iter().map(|(_, u)| u.bytes).sum();
            println!("Total: {}", format_size(total));
        }
    }

    Ok(())
}

fn run_disk(service: &StorageService, format: OutputFormat) -> Result<()> {
    let capacity = service.volume_capacity()?;

    match format {
        OutputFormat::Json => {
            let snapshot = DiskSnapshot::from(capacity);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Human => {
            println!("Volume of {}:", service.home_directory().display());
            println!("  Total: {}", format_size(capacity.total));
            println!("  Free: {}", format_size(capacity.free));
            println!(
                "  Used: {} ({:.1}%)",
                format_size(capacity.used()),
                percent(capacity.used(), capacity.total)
            );
        }
    }

    Ok(())
}

fn run_size(path: &str) {
    let target = Path::new(path);
    let measured = usage::measure(target);

    println!("{}:", target.display());
    println!("  Files: {}", measured.files);
    println!("  Dirs: {}", measured.dirs);
    println!(
        "  Size: {} ({} bytes)",
        format_size(measured.bytes),
        measured.bytes
    );
    if measured.skipped > 0 {
        println!("  Skipped: {} unreadable entries", measured.skipped);
    }
}

fn run_list(service: &StorageService, path: Option<&str>) {
    let listed = service.path_list(path.map(Path::new));
    for path in &listed {
        println!("{}", path.display());
    }
    log::info!("{} file(s)", listed.len());
}

fn run_delete(service: &StorageService, path: &str, yes: bool) -> ExitCode {
    let target = Path::new(path);

    if !yes {
        let measured = usage::measure(target);
        println!(
            "Would delete {} files and {} directories ({})",
            measured.files,
            measured.dirs,
            format_size(measured.bytes)
        );
        println!("Use --yes to execute");
        return ExitCode::SUCCESS;
    }

    let outcome = service.delete_path(target);
    report_purge(&outcome);
    purge_exit_code(&outcome)
}

fn run_clear_cache(service: &StorageService, yes: bool) -> ExitCode {
    let root = service.layout().cache_root();

    if !yes {
        let measured = usage::measure(root);
        println!(
            "Would clear {} ({} in {} files)",
            root.display(),
            format_size(measured.bytes),
            measured.files
        );
        println!("Use --yes to execute");
        return ExitCode::SUCCESS;
    }

    let outcome = service.clear_all_cache();
    report_purge(&outcome);
    purge_exit_code(&outcome)
}

fn report_purge(outcome: &PurgeOutcome) {
    println!("Results:");
    println!("  Removed: {} entries", outcome.removed);
    println!("  Failed: {} entries", outcome.failed());

    if !outcome.failed_paths.is_empty() {
        println!("\nFailed entries:");
        for (path, error) in &outcome.failed_paths {
            println!("  - {}: {}", path.display(), error);
        }
    }
}

fn purge_exit_code(outcome: &PurgeOutcome) -> ExitCode {
    if outcome.ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run_config(action: ConfigActions, mut config: Config) -> Result<()> {
    match action {
        ConfigActions::Show => {
            let layout = SandboxLayout::resolve(&config.sandbox);
            println!("Current configuration:");
            println!("  File: {}", Config::config_path().display());
            println!("  App id: {}", config.sandbox.app_id);
            println!("Resolved layout:");
            println!("  Home: {}", layout.home().display());
            println!(
                "  App root: {}",
                layout.category_root(sandbox::Category::App).display()
            );
            println!("  Cache root: {}", layout.cache_root().display());
            println!("  Data root: {}", layout.data_root().display());
        }
        ConfigActions::Set { key, value } => match key.as_str() {
            "app_id" => {
                config.sandbox.app_id = value.clone();
                config.save()?;
                println!("Set app_id to {}", value);
            }
            "root" => {
                config.sandbox.root = Some(PathBuf::from(&value));
                config.save()?;
                println!("Set root to {}", value);
            }
            "app_dir" => {
                config.sandbox.app_dir = Some(PathBuf::from(&value));
                config.save()?;
                println!("Set app_dir to {}", value);
            }
            "cache_dir" => {
                config.sandbox.cache_dir = Some(PathBuf::from(&value));
                config.save()?;
                println!("Set cache_dir to {}", value);
            }
            "data_dir" => {
                config.sandbox.data_dir = Some(PathBuf::from(&value));
                config.save()?;
                println!("Set data_dir to {}", value);
            }
            _ => {
                println!("Unknown key: {}", key);
                println!("Available keys: app_id, root, app_dir, cache_dir, data_dir");
            }
        },
    }

    Ok(())
}
