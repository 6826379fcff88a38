use anyhow::Result;
use clap::Parser;
use s3_image_resizer::app::App;
use s3_image_resizer::models::{Config, ResizeJob};
use s3_image_resizer::storage::ObjectMetadata;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "s3-image-resizer")]
#[command(about = "Fetch an image, resize it and publish it to S3")]
struct CliArgs {
    /// URL of the source image.
    #[arg(value_name = "URL")]
    url: String,

    /// Destination bucket.
    #[arg(long)]
    bucket: String,

    /// Destination key. Defaults to a random `<uuid>.jpg`.
    #[arg(long)]
    key: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// JPEG quality, 1-100.
    #[arg(long, default_value_t = 95)]
    quality: u8,

    /// Keep the stored object private instead of public-read.
    #[arg(long)]
    private: bool,

    /// Skip EXIF orientation correction.
    #[arg(long)]
    no_orientate: bool,

    /// Extra object metadata, repeatable.
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta_arg)]
    meta: Vec<(String, String)>,

    /// Print a JSON report instead of the bare URL.
    #[arg(long)]
    json: bool,

    /// Read configuration from this env file instead of `.env`.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

fn parse_meta_arg(input: &str) -> std::result::Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid metadata '{}'. Expected format: KEY=VALUE", input)),
    }
}

impl CliArgs {
    fn into_job(self) -> ResizeJob {
        let key = self
            .key
            .unwrap_or_else(|| format!("{}.jpg", Uuid::new_v4()));

        let mut job = ResizeJob::new(self.url, self.bucket, key);
        job.width = self.width;
        job.height = self.height;
        job.quality = self.quality;
        job.public = !self.private;
        job.orientate = !self.no_orientate;
        job.metadata = self.meta.into_iter().collect::<ObjectMetadata>();
        job
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_image_resizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let json = args.json;
    let env_file = args.env_file.clone();
    let job = args.into_job();

    info!("Resizing {} into {}/{}", job.url, job.bucket, job.key);

    let app = match env_file {
        Some(path) => match Config::from_env_file(&path) {
            Ok(config) => App::from_config(config).await,
            Err(e) => Err(e),
        },
        None => App::new().await,
    };

    match app {
        Ok(app) => match app.run(job).await {
            Ok(stored) => {
                if json {
                    println!("{}", stored.to_json()?);
                } else {
                    println!("{}", stored.url);
                }
                Ok(())
            }
            Err(e) => {
                error!("Resize failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
