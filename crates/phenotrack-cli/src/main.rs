use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use phenotrack_resolve::{known_headers, LINE_MAPPING_HEADERS, REQUIRED_HEADERS};
use phenotrack_sync::{Algorithm, DigestProvider, LocalDirTransport, StreamingDigests, SyncEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

mod config;

use config::CliConfig;

fn cli() -> Command {
    Command::new("phenotrack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plant phenomics tray-scan tooling")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level unless RUST_LOG is set"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("digest")
                .about("Print digests of files")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Files to digest"),
                )
                .arg(
                    Arg::new("algorithm")
                        .long("algorithm")
                        .short('a')
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(Algorithm))
                        .help("Digest algorithm (sha256, sha512, blake3); repeatable"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Upload files and sidecar digests to the mounted remote tree")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Files under the configured local root"),
                ),
        )
        .subcommand(Command::new("headers").about("List tray-scan and line mapping headers"))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .try_init();
}

async fn digest(args: &ArgMatches) -> anyhow::Result<()> {
    let files: Vec<PathBuf> = args.get_many::<PathBuf>("files").into_iter().flatten().cloned().collect();
    let algorithms: Vec<Algorithm> = match args.get_many::<Algorithm>("algorithm") {
        Some(values) => values.copied().collect(),
        None => vec![Algorithm::Sha256],
    };
    let record = StreamingDigests::new(algorithms).digests(&files).await?;
    for (path, digests) in &record {
        for (algorithm, value) in digests {
            println!("{algorithm}  {value}  {}", path.display());
        }
    }
    Ok(())
}

async fn sync(args: &ArgMatches) -> anyhow::Result<()> {
    let config_path = args
        .get_one::<PathBuf>("config")
        .context("--config is required")?;
    let files: Vec<PathBuf> = args.get_many::<PathBuf>("files").into_iter().flatten().cloned().collect();
    let config = CliConfig::load(config_path)?;
    tracing::debug!("resolver settings: {:?}", config.resolver);

    let transport = Arc::new(LocalDirTransport::new(&config.sync.remote_mount));
    let digests = StreamingDigests::new(config.sync.engine.algorithms.clone());
    let engine = SyncEngine::new(transport, config.sync.engine);

    let report = engine.sync_with(&files, &digests).await?;
    for file in &report.files {
        println!(
            "{}  {:?}  {} sidecars  -> {}",
            file.local.display(),
            file.content,
            file.digests.len(),
            file.remote.display()
        );
    }
    println!("{} transfers, {} files unchanged", report.transfers(), report.unchanged());
    Ok(())
}

fn headers() {
    println!("Tray scan headers (* required):");
    for header in known_headers() {
        let mark = if REQUIRED_HEADERS.contains(&header) { "*" } else { " " };
        println!("  {mark} {header}");
    }
    println!("Line mapping headers:");
    for header in LINE_MAPPING_HEADERS {
        println!("    {header}");
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("digest", args)) => digest(args).await,
        Some(("sync", args)) => sync(args).await,
        Some(("headers", _)) => {
            headers();
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn repeated_algorithms_parse() {
        let matches = cli()
            .try_get_matches_from(["phenotrack", "digest", "-a", "sha256", "--algorithm", "blake3", "a.zip"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let algorithms: Vec<Algorithm> = args.get_many::<Algorithm>("algorithm").unwrap().copied().collect();
        assert_eq!(algorithms, vec![Algorithm::Sha256, Algorithm::Blake3]);
    }

    #[test]
    fn sync_requires_config() {
        assert!(cli().try_get_matches_from(["phenotrack", "sync", "a.zip"]).is_err());
    }

    #[tokio::test]
    async fn sync_into_mounted_directory() {
        let local = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();
        let file = local.path().join("bag.zip");
        std::fs::write(&file, b"bag").unwrap();
        let config = local.path().join("phenotrack.toml");
        std::fs::write(
            &config,
            format!(
                "[sync]\nlocal_root = {:?}\nremote_root = \"/bags\"\nremote_mount = {:?}\n",
                local.path().display().to_string(),
                mount.path().display().to_string()
            ),
        )
        .unwrap();

        let matches = cli()
            .try_get_matches_from([
                "phenotrack".into(),
                "sync".into(),
                "--config".into(),
                config.into_os_string(),
                file.into_os_string(),
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        sync(args).await.unwrap();
        assert!(mount.path().join("bags/bag.zip").exists());
        assert!(mount.path().join("bags/bag.zip.sha256").exists());
    }
}
