use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vodpipe::cli::{Cli, Commands};
use vodpipe::config::Config;
use vodpipe::pipeline::MediaPipeline;
use vodpipe::storage::azure::AzureBlobStore;
use vodpipe::transcribe::rest::RestSpeechBackend;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Audio { url } => {
            config.validate_storage()?;
            let blob = build_pipeline(&config)?.ingest_audio(&url).await?;
            println!("{blob}");
        }
        Commands::Captions { blob } => {
            config.validate_storage()?;
            config.validate_speech()?;
            let artifacts = build_pipeline(&config)?.build_captions(&blob).await?;
            println!("{}", artifacts.caption_url);
        }
        Commands::Hls { url } => {
            config.validate_storage()?;
            let master = build_pipeline(&config)?.package_hls(&url).await?;
            println!("{master}");
        }
        Commands::Run { url } => {
            config.validate_storage()?;
            config.validate_speech()?;
            let pipeline = build_pipeline(&config)?;
            let blob = pipeline.ingest_audio(&url).await?;
            let artifacts = pipeline.build_captions(&blob).await?;
            let master = pipeline.package_hls(&url).await?;
            println!("{}", artifacts.caption_url);
            println!("{master}");
        }
        Commands::Check => {
            check_dependencies(&config);
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vodpipe={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn build_pipeline(config: &Config) -> Result<MediaPipeline> {
    let store = Arc::new(AzureBlobStore::new(
        config.storage.account.clone(),
        config.storage.sas_token.clone(),
    ));
    let speech = Arc::new(RestSpeechBackend::new(
        config.speech.key.clone(),
        config.speech.region.clone(),
        config.speech.language.clone(),
    ));
    Ok(MediaPipeline::new(store, speech, config.clone()))
}

fn check_dependencies(config: &Config) {
    match Command::new(&config.encoder.binary).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let first_line = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("unknown version")
                .to_string();
            println!("encoder: {first_line}");
        }
        Ok(output) => {
            println!("encoder: {} exited with {}", config.encoder.binary, output.status);
        }
        Err(_) => {
            println!(
                "encoder: {} not found (install ffmpeg or set VODPIPE_FFMPEG)",
                config.encoder.binary
            );
        }
    }

    println!(
        "storage: {}",
        if config.validate_storage().is_ok() {
            "configured"
        } else {
            "missing account (set VODPIPE_ACCOUNT)"
        }
    );
    println!(
        "speech: {}",
        if config.validate_speech().is_ok() {
            "configured"
        } else {
            "missing key/region (set VODPIPE_SPEECH_KEY, VODPIPE_SPEECH_REGION)"
        }
    );
    println!("version: {}", vodpipe::version_string());
}
