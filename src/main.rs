//! seqdrill — catalogs a sequencing-pipeline output tree.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use seqdrill::cli::{Cli, Commands, ScanArgs};
use seqdrill::{Config, ScanError, ScanOptions, Scanner, Stage};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(EnvFilter::from_default_env().add_directive("seqdrill=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let config = Config::load();
    let mut options = config.scan.to_scan_options();
    if args.no_strict {
        options.strict = false;
    }
    if args.include_non_bio_mismatches {
        options.include_non_bio_mismatches = true;
    }
    if let Some(chunk_size) = args.chunk_size_bytes {
        options.chunk_size_bytes = chunk_size;
    }

    let json_output = args.json.is_some();
    let scanner = Scanner::new(options);

    let pb = if !json_output {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓▒░"),
        );
        bar.set_message("classifying...");
        Some(bar)
    } else {
        None
    };

    if let Some(bar) = pb.clone() {
        let bar = Arc::new(Mutex::new(bar));
        scanner.set_progress_callback(Box::new(move |event| {
            let bar = bar.lock().unwrap();
            if event.total > 0 {
                bar.set_length(event.total as u64);
            }
            bar.set_position(event.scanned as u64);
            let label = match event.stage {
                Stage::Classify => "classifying",
                Stage::DedupTier0 => "deduplicating (tier 0/1)",
                Stage::DedupTier2 => "deduplicating (tier 2)",
                Stage::Done => "done",
                Stage::Error => "error",
            };
            bar.set_message(label);
        }));
    }

    let report = match scanner.scan(&args.root) {
        Ok(r) => r,
        Err(ScanError::RootMissing(path)) => {
            if let Some(bar) = &pb {
                bar.finish_and_clear();
            }
            eprintln!("{} scan root does not exist: {}", "error:".red().bold(), path);
            std::process::exit(1);
        }
    };

    if let Some(bar) = &pb {
        bar.finish_and_clear();
    }

    if let Some(json_path) = args.json {
        std::fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
        println!("wrote {}", json_path.display());
        return Ok(());
    }

    print_human_summary(&report);
    Ok(())
}

fn print_human_summary(report: &seqdrill::Report) {
    println!(
        "{} {} files scanned in {:.2}s",
        "seqdrill:".bright_cyan().bold(),
        report.n_files,
        report.stats.wall_clock_s
    );
    if let Some(rss) = report.stats.peak_rss_mb {
        println!("  peak RSS: {} MiB", rss);
    }

    if !report.duplicate_groups.is_empty() {
        println!("\n{}", "duplicate groups:".bright_white().bold());
        for group in &report.duplicate_groups {
            println!(
                "  {} members, {} total ({})",
                group.count,
                humansize::format_size(group.total_size, humansize::BINARY),
                &group.sha256[..12]
            );
            for path in &group.paths {
                println!("    {}", path);
            }
        }
    }

    if !report.mismatches.is_empty() {
        println!("\n{}", "mismatches:".bright_white().bold());
        for m in &report.mismatches {
            println!(
                "  {} (header={}, extension_logical={})",
                m.path, m.header_type, m.extension_logical
            );
        }
    }

    if !report.erasable_candidates.is_empty() {
        println!("\n{}", "erasable candidates:".bright_white().bold());
        for c in &report.erasable_candidates {
            println!("  {} — {}", c.path, c.reason);
        }
    }
}
