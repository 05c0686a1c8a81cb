use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use playout_config::{SchedulingConfig, SchedulingConfigSource};
use playout_core::{BuildOutcome, InMemoryCatalog, PlayoutBuilder};
use playout_model::{Playout, PlayoutBuildMode};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "playoutctl",
    about = "Build channel playouts from catalog and schedule documents"
)]
struct Cli {
    /// Scheduling config file (TOML or JSON). Falls back to the usual
    /// environment and default-file lookup.
    #[arg(long, global = true, env = "PLAYOUT_CONFIG_PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build or extend a playout and write the result as JSON
    Build(BuildArgs),
    /// Check a playout document's schedules without building
    Validate {
        #[arg(long)]
        playout: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    /// Catalog document listing media items, collections and playlists
    #[arg(long)]
    catalog: PathBuf,
    /// Playout document: schedule, alternates, and any previous build state
    #[arg(long)]
    playout: PathBuf,
    /// Where to write the built playout; defaults to overwriting `--playout`
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "continue")]
    mode: ModeArg,
    /// Build start as RFC 3339; defaults to now
    #[arg(long, value_parser = parse_time)]
    start: Option<DateTime<FixedOffset>>,
    /// Overrides `days_to_build` from the config
    #[arg(long)]
    days: Option<u32>,
    /// Overrides the config seed for fresh enumerator states
    #[arg(long, env = "PLAYOUT_SEED")]
    seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Continue,
    Refresh,
    Reset,
}

impl From<ModeArg> for PlayoutBuildMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Continue => PlayoutBuildMode::Continue,
            ModeArg::Refresh => PlayoutBuildMode::Refresh,
            ModeArg::Reset => PlayoutBuildMode::Reset,
        }
    }
}

fn parse_time(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
}

fn load_config(path: Option<&Path>) -> Result<(SchedulingConfig, SchedulingConfigSource)> {
    match path {
        Some(path) => Ok((
            SchedulingConfig::load_from_file(path)?,
            SchedulingConfigSource::EnvPath(path.to_path_buf()),
        )),
        None => SchedulingConfig::load_from_env(),
    }
}

fn read_playout(path: &Path) -> Result<Playout> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read playout {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse playout {}", path.display()))
}

fn write_playout(path: &Path, playout: &Playout) -> Result<()> {
    let json = serde_json::to_string_pretty(playout)?;
    fs::write(path, json).with_context(|| format!("failed to write playout {}", path.display()))
}

/// Loads both documents, builds, and writes the playout back out.
fn run_build(
    args: &BuildArgs,
    config: &SchedulingConfig,
    cancellation: CancellationToken,
) -> Result<BuildOutcome> {
    let mut settings = config.builder_settings()?;
    if let Some(days) = args.days {
        settings.days_to_build = days;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let catalog = InMemoryCatalog::load(&args.catalog)?;
    let mut playout = read_playout(&args.playout)?;
    let start = args.start.unwrap_or_else(|| Utc::now().fixed_offset());

    let outcome = PlayoutBuilder::new(&catalog, settings)
        .with_cancellation(cancellation)
        .build(&mut playout, args.mode.into(), start)?;

    let output = args.output.as_deref().unwrap_or(&args.playout);
    write_playout(output, &playout)?;
    Ok(outcome)
}

fn run_validate(path: &Path) -> Result<()> {
    let playout = read_playout(path)?;
    let schedules =
        std::iter::once(&playout.schedule).chain(playout.alternates.iter().map(|a| &a.schedule));

    let mut failed = 0usize;
    for schedule in schedules {
        if let Err(errors) = schedule.validate() {
            failed += 1;
            for error in errors.iter() {
                warn!(schedule = %schedule.name, field = %error.field, "{}", error.message);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} schedule(s) failed validation");
    }
    info!(path = %path.display(), "Playout schedules are valid");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = playout_config::load_dotenv();
    let cli = Cli::parse();
    let (config, source) = load_config(cli.config.as_deref())?;
    playout_config::init_tracing(&config.logging)?;

    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded .env file");
    }
    info!(?source, "loaded scheduling config");

    match cli.command {
        Command::Build(args) => {
            let cancellation = CancellationToken::new();
            let on_signal = cancellation.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received; stopping after the current rule");
                    on_signal.cancel();
                }
            });

            let outcome =
                tokio::task::spawn_blocking(move || run_build(&args, &config, cancellation))
                    .await
                    .context("build task panicked")??;

            info!(
                added = outcome.items_added,
                removed = outcome.items_removed,
                next_start = ?outcome.next_start,
                cancelled = outcome.cancelled,
                "build complete"
            );
        }
        Command::Validate { playout } => run_validate(&playout)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use playout_model::{CollectionId, CollectionKey, MediaItem, ProgramSchedule, ScheduleItem};
    use tempfile::TempDir;

    fn write_documents(dir: &TempDir) -> (PathBuf, PathBuf) {
        let catalog = InMemoryCatalog::new().with_collection(
            1,
            vec![
                MediaItem::movie(1, TimeDelta::minutes(30)),
                MediaItem::movie(2, TimeDelta::minutes(45)),
            ],
        );
        let playout = Playout::new(ProgramSchedule::new(
            "movies",
            vec![ScheduleItem::one(0, CollectionKey::Collection(CollectionId::new(1)))],
        ));

        let catalog_path = dir.path().join("catalog.json");
        let playout_path = dir.path().join("playout.json");
        fs::write(&catalog_path, serde_json::to_string(&catalog).expect("catalog json"))
            .expect("write catalog");
        write_playout(&playout_path, &playout).expect("write playout");
        (catalog_path, playout_path)
    }

    fn args(catalog: PathBuf, playout: PathBuf) -> BuildArgs {
        BuildArgs {
            catalog,
            playout,
            output: None,
            mode: ModeArg::Reset,
            start: Some(parse_time("2024-05-01T06:00:00Z").expect("time")),
            days: Some(1),
            seed: Some(3),
        }
    }

    #[test]
    fn test_build_writes_playout_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let (catalog, playout) = write_documents(&dir);

        let outcome = run_build(
            &args(catalog, playout.clone()),
            &SchedulingConfig::default(),
            CancellationToken::new(),
        )
        .expect("build");

        assert!(outcome.items_added > 0);
        let built = read_playout(&playout).expect("read back");
        assert!(built.anchor.is_some());
        assert!(!built.items.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_schedule() {
        let dir = TempDir::new().expect("temp dir");
        let playout = Playout::new(ProgramSchedule::new(
            "bad",
            vec![ScheduleItem::duration(
                0,
                CollectionKey::Collection(CollectionId::new(1)),
                TimeDelta::zero(),
                playout_model::TailMode::None,
            )],
        ));
        let path = dir.path().join("playout.json");
        write_playout(&path, &playout).expect("write");

        assert!(run_validate(&path).is_err());
    }

    #[test]
    fn test_time_argument_is_rfc3339() {
        assert!(parse_time("2024-05-01T06:00:00+02:00").is_ok());
        assert!(parse_time("yesterday").is_err());
    }
}
