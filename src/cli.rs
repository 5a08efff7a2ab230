use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single subtitle file
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language (display name or ISO 639-1 code)
        #[arg(short, long)]
        target_lang: String,

        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Translate every SRT file in a directory
    Batch {
        /// Input directory containing SRT files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Target language (display name or ISO 639-1 code)
        #[arg(short, long)]
        target_lang: String,

        /// Output directory (defaults to each file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Translate a file and send it to the delivery webhook
    Deliver {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language (display name or ISO 639-1 code)
        #[arg(short, long)]
        target_lang: String,

        /// Recipient email address
        #[arg(short, long)]
        email: String,

        /// Webhook URL (overrides delivery.webhook_url)
        #[arg(long)]
        webhook_url: Option<String>,
    },

    /// Run the webhook listener that translates cloud files on request
    Serve {
        /// Bind address (overrides server.bind_address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List supported target languages
    Languages,

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "subtrans.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
