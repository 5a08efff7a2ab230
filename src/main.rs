//! Subtrans - SubRip Subtitle Translation
//!
//! Command-line entry point: local translation, batch translation, webhook
//! delivery and the cloud-file webhook listener.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use subtrans::cli::{Args, Commands};
use subtrans::config::Config;
use subtrans::delivery::{DriveStore, WebhookNotifier};
use subtrans::error::SubtransError;
use subtrans::languages::SUPPORTED_LANGUAGES;
use subtrans::pipeline::{Pipeline, TranslatedFile};
use subtrans::server::{ServerState, WebhookServer};
use subtrans::translate::{CompletionClient, CompletionClientFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("subtrans.toml").exists() {
                info!("Found subtrans.toml in current directory, loading...");
                Config::from_file("subtrans.toml")?
            } else {
                Config::default()
            }
        }
    };

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            warn!("Received Ctrl+C signal, initiating graceful shutdown...");
            ctrl_c_token.cancel();
        }
    });

    match args.command {
        Commands::Languages => {
            println!("\nSupported target languages:");
            for language in SUPPORTED_LANGUAGES {
                println!("  {}", language);
            }
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(SubtransError::Config(format!(
                    "{} already exists; pass --force to overwrite",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Translate {
            input,
            target_lang,
            output_dir,
        } => {
            let pipeline = build_pipeline(&config).await?;
            let progress =
                stage_spinner(format!("Translating {} into {}...", input.display(), target_lang));

            let result = pipeline
                .translate_file(&input, output_dir.as_deref(), &target_lang, &cancel)
                .await;
            progress.finish_and_clear();

            report(&result?);
        }
        Commands::Batch {
            input_dir,
            target_lang,
            output_dir,
        } => {
            let pipeline = build_pipeline(&config).await?;
            let progress = stage_spinner(format!(
                "Translating {} into {}...",
                input_dir.display(),
                target_lang
            ));

            let result = pipeline
                .translate_directory(&input_dir, output_dir.as_deref(), &target_lang, &cancel)
                .await;
            progress.finish_and_clear();

            let summary = result?;
            for file in &summary.translated {
                report(file);
            }
            for (path, reason) in &summary.failed {
                println!("Failed: {} ({})", path.display(), reason);
            }
            println!(
                "Translated {} file(s), {} failed",
                summary.translated.len(),
                summary.failed.len()
            );
        }
        Commands::Deliver {
            input,
            target_lang,
            email,
            webhook_url,
        } => {
            let url = webhook_url
                .or_else(|| config.delivery.webhook_url.clone())
                .ok_or_else(|| {
                    SubtransError::Config("No delivery webhook URL configured".to_string())
                })?;
            let pipeline = build_pipeline(&config).await?;
            let notifier = WebhookNotifier::new(url)?;

            let progress = stage_spinner(format!(
                "Translating {} into {} and delivering to {}...",
                input.display(),
                target_lang,
                email
            ));
            let result = pipeline
                .deliver_file(&notifier, &input, &target_lang, &email, &cancel)
                .await;
            progress.finish_and_clear();

            let delivered = result?;
            report(&delivered.file);
            println!("File translated into {} successfully!", delivered.file.language);
            match delivered.receipt.link {
                Some(link) => println!("Download the translated file: {}", link),
                None => println!("Warning: the delivery webhook did not return a download link."),
            }
        }
        Commands::Serve { bind } => {
            let mut server_config = config.server.clone();
            if let Some(bind) = bind {
                server_config.bind_address = bind;
            }

            let state = ServerState {
                pipeline: Arc::new(build_pipeline(&config).await?),
                store: Arc::new(DriveStore::new(config.drive.clone())?),
                cancel: cancel.clone(),
            };

            WebhookServer::new(server_config, state).run().await?;
        }
    }

    info!("Subtrans completed successfully");
    Ok(())
}

/// Create the completion client, check it is reachable and wrap it in a pipeline
async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let client = CompletionClientFactory::create_client(&config.translate)?;
    if let Err(e) = client.check_availability().await {
        warn!("Completion service check failed: {}", e);
    }
    Ok(Pipeline::with_client(config.translate.clone(), client))
}

fn stage_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn report(file: &TranslatedFile) {
    println!(
        "{} -> {} ({} blocks)",
        file.language,
        file.path.display(),
        file.blocks
    );
    for diagnostic in &file.diagnostics {
        println!("  warning: {}", diagnostic);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subtrans.log").display()
    );

    Ok(())
}
