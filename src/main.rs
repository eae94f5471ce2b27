use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use manifestclient::{Dockercfg, ImageReference, ManifestVersion, RegistrySession};

/// Query which manifest digests a registry holds for an image
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image reference ([hostname/]name[:tag])
    image: String,

    /// Registry locator, e.g. registry.example.com:5000 or https://registry.example.com
    #[arg(short, long)]
    registry: String,

    /// Fall back to plain http when https is unreachable, and skip
    /// certificate verification
    #[arg(long)]
    insecure: bool,

    /// Directory containing a .dockercfg credentials file
    #[arg(long)]
    dockercfg: Option<PathBuf>,

    /// Comma-separated manifest versions to probe
    /// (v1, v2, v2_list, oci, oci_index); defaults to v1,v2
    #[arg(long, value_delimiter = ',')]
    versions: Vec<String>,

    /// Fail when no digest could be resolved at all
    #[arg(long)]
    require_digest: bool,

    /// Fetch the manifest list document instead of probing digests
    #[arg(long)]
    manifest_list: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let image: ImageReference = cli
        .image
        .parse()
        .with_context(|| format!("cannot parse image reference {}", cli.image))?;

    let dockercfg = match &cli.dockercfg {
        Some(dir) => Some(Dockercfg::new(dir)?),
        None => None,
    };

    let mut session = RegistrySession::with_timeout(
        &cli.registry,
        cli.insecure,
        dockercfg.as_ref(),
        cli.timeout.map(Duration::from_secs),
    )?;

    if cli.manifest_list {
        match session.get_manifest_list(&image).await? {
            Some(list) => println!("{}", serde_json::to_string_pretty(&list)?),
            None => bail!("{} has no manifest list on {}", image, cli.registry),
        }
        return Ok(());
    }

    let versions = cli
        .versions
        .iter()
        .map(|name| name.parse())
        .collect::<manifestclient::Result<Vec<ManifestVersion>>>()?;
    let versions = if versions.is_empty() {
        None
    } else {
        Some(versions.as_slice())
    };

    let digests = session
        .get_manifest_digests(&image, versions, cli.require_digest)
        .await?;
    println!("{}", serde_json::to_string_pretty(&digests)?);

    Ok(())
}
