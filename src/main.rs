//! CLI entry point for the mediagrab tool.
//!
//! The CLI is a thin front end over [`MediaService`]: it drives the same
//! pipeline a chat bot would, with a console spinner standing in for status
//! messages and a copy into the output directory standing in for the upload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use indicatif::ProgressBar;
use tracing::{debug, info};

use mediagrab_core::{
    Config, Delivery, DeliveryError, FfmpegTranscoder, MediaService, RefusalReason,
    ServiceOutcome, UploadKind, YtDlpRetriever,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = Config::from_env()?;
    if let Some(max_size_mb) = args.max_size_mb {
        config.max_payload_bytes = max_size_mb * 1024 * 1024;
    }

    info!("Mediagrab starting");

    let retriever = Arc::new(YtDlpRetriever::new(
        config.ytdlp_bin.clone(),
        config.attempt_timeout,
    ));
    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.ffmpeg_bin.clone(),
        config.transcode_timeout,
    ));
    let service = MediaService::new(&config, retriever, transcoder)?;

    let delivery = ConsoleDelivery::new(args.output_dir.clone(), args.quiet);
    let outcome = service
        .fetch_and_deliver(&args.url, args.kind.into(), "cli", &delivery)
        .await?;
    delivery.finish();

    match outcome {
        ServiceOutcome::Delivered { size_bytes } => {
            info!(size_bytes, "Delivered");
            Ok(())
        }
        ServiceOutcome::Refused(RefusalReason::UnsupportedPlatform) => {
            anyhow::bail!(
                "platform not supported: {} (supported: YouTube, Twitter/X, Instagram, SoundCloud)",
                args.url
            )
        }
        ServiceOutcome::Refused(RefusalReason::RateLimited) => {
            anyhow::bail!("rate limited; wait a minute and retry")
        }
        ServiceOutcome::Refused(RefusalReason::SessionExpired) => {
            anyhow::bail!("session expired; resend the URL")
        }
        ServiceOutcome::DownloadFailed(kind) => {
            anyhow::bail!("download failed: {}", kind.label())
        }
        ServiceOutcome::UploadFailed { detail } => {
            anyhow::bail!("could not place the output file: {detail}")
        }
    }
}

/// Console stand-in for the messaging collaborator: status lines drive a
/// spinner, the upload is a copy into the output directory.
struct ConsoleDelivery {
    progress: ProgressBar,
    output_dir: PathBuf,
}

impl ConsoleDelivery {
    fn new(output_dir: PathBuf, quiet: bool) -> Self {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        progress.enable_steady_tick(Duration::from_millis(120));
        Self {
            progress,
            output_dir,
        }
    }

    fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.progress.set_message(text.to_string());
        Ok(())
    }

    async fn edit_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.progress.set_message(text.to_string());
        Ok(())
    }

    async fn upload(
        &self,
        file: &std::path::Path,
        kind: UploadKind,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|error| DeliveryError::Failed {
            detail: format!("cannot create {}: {error}", self.output_dir.display()),
        })?;

        let name = file.file_name().ok_or_else(|| DeliveryError::Failed {
            detail: format!("downloaded path has no file name: {}", file.display()),
        })?;
        let dest = self.output_dir.join(name);

        std::fs::copy(file, &dest).map_err(|error| DeliveryError::Failed {
            detail: format!("cannot copy to {}: {error}", dest.display()),
        })?;

        self.progress.println(format!(
            "[{}] {} ({caption})",
            kind_tag(kind),
            dest.display()
        ));
        Ok(())
    }
}

fn kind_tag(kind: UploadKind) -> &'static str {
    match kind {
        UploadKind::Audio => "audio",
        UploadKind::Video => "video",
        UploadKind::Photo => "photo",
    }
}
