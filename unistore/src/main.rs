use anyhow::Context;
use clap::Parser;
use futures::{StreamExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing_subscriber::EnvFilter;
use unistore::Error;

use crate::cli::{Args, Command};

mod cli;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.backend_config()?;
    config.validate().await?;
    let storage = config.connect().await;
    tracing::debug!("using backend {config:?}");

    match args.command {
        Command::Exists { filename } => match storage.exists(&filename).await {
            Ok(meta) => println!("{}", serde_json::to_string_pretty(&meta)?),
            Err(Error::Storage(err)) => {
                println!("{}", serde_json::to_string_pretty(&err)?);
                std::process::exit(1);
            }
            Err(err) => Err(err).with_context(|| format!("checking `{filename}`"))?,
        },
        Command::Read { filename, output } => {
            let mut out: Box<dyn AsyncWrite + Unpin + Send> = match &output {
                Some(path) => Box::new(
                    tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(tokio::io::stdout()),
            };
            let mut stream = storage.read(&filename);
            let mut total = 0usize;
            while let Some(chunk) = stream
                .try_next()
                .await
                .with_context(|| format!("reading `{filename}`"))?
            {
                total += chunk.len();
                out.write_all(&chunk).await?;
            }
            out.flush().await?;
            tracing::info!("read `{filename}` ({total} bytes)");
        }
        Command::Write { filename, input } => {
            let reader: Box<dyn AsyncRead + Unpin + Send> = match &input {
                Some(path) => Box::new(
                    tokio::fs::File::open(path)
                        .await
                        .with_context(|| format!("opening {}", path.display()))?,
                ),
                None => Box::new(tokio::io::stdin()),
            };
            let stream = ReaderStream::new(reader).map_err(Error::from).boxed();
            let receipt = storage
                .write(&filename, stream)
                .await
                .with_context(|| format!("writing `{filename}`"))?;
            tracing::info!("wrote `{filename}`");
            println!("{}", serde_json::to_string(&receipt)?);
        }
    }
    Ok(())
}
