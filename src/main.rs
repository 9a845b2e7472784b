use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use mutsim::config::Config;
use mutsim::constants::SBS_SCALE;
use mutsim::index::store::{DirStore, IndexCache, IndexStore, SqliteStore};
use mutsim::index::{self, TripletCountCatalog};
use mutsim::io::{fasta, lists};
use mutsim::mutation::FrequencySpectrum;
use mutsim::resolve::{EnsemblClient, GenomicResolver};
use mutsim::signature;
use mutsim::simulate::{self, Simulator};
use mutsim::variant::CoordinateExtractor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// One index file per transcript
    Dir,
    /// A single SQLite database
    Sqlite,
}

#[derive(Parser)]
#[command(name = "mutsim")]
#[command(version, about = "Simulate signature-driven SNVs on transcripts and report them as VCF")]
struct Cli {
    /// Transcript sequences (FASTA); indexes are built and stored
    #[arg(short = 'i', long)]
    fasta: Option<PathBuf>,

    /// Transcript list whose indexes are already stored
    #[arg(short = 't', long)]
    transcripts: Option<PathBuf>,

    /// Database folder of position indexes
    #[arg(short = 'd', long, required_unless_present_any = ["hgvs", "convert_sbs"])]
    database: Option<PathBuf>,

    /// Saved count catalog
    #[arg(short = 'c', long)]
    catalog: Option<PathBuf>,

    /// Mutational profile (triplet, REF/ALT, count)
    #[arg(short = 'f', long, required_unless_present_any = ["hgvs", "convert_sbs"])]
    profile: Option<PathBuf>,

    /// Number of events per run
    #[arg(short = 'n', long, default_value_t = 100)]
    events: usize,

    /// Number of runs
    #[arg(short = 'r', long, default_value_t = 1)]
    runs: usize,

    /// Inputs per annotation request
    #[arg(short = 'b', long)]
    batch_size: Option<usize>,

    /// Coding notations to resolve directly, skipping sampling
    #[arg(short = 'o', long)]
    hgvs: Option<PathBuf>,

    /// Seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Annotation service endpoint
    #[arg(long)]
    url: Option<String>,

    #[arg(long, value_enum, default_value_t = StoreKind::Dir)]
    store: StoreKind,

    /// Write the count catalog built in this run
    #[arg(long)]
    save_catalog: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Convert a COSMIC SBS matrix into a profile and exit
    #[arg(long, requires = "sbs_column")]
    convert_sbs: Option<PathBuf>,

    /// Signature column of the SBS matrix
    #[arg(long)]
    sbs_column: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("could not load configuration {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(ref url) = cli.url {
        config.service.url = url.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.service.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

fn open_store(kind: StoreKind, dir: &Path) -> Result<Box<dyn IndexStore>> {
    let store: Box<dyn IndexStore> = match kind {
        StoreKind::Dir => Box::new(DirStore::open(dir)?),
        StoreKind::Sqlite => {
            fs::create_dir_all(dir)?;
            Box::new(SqliteStore::open(dir.join("indexes.sqlite"))?)
        },
    };
    Ok(store)
}

/// Build or load the count catalog, returning it with a name for outputs.
fn build_catalog(cli: &Cli, store: &mut dyn IndexStore) -> Result<(TripletCountCatalog, String)> {
    let mut catalog = TripletCountCatalog::new();

    let name = if let Some(ref path) = cli.fasta {
        let reader = fasta::Reader::from_file(path)
            .with_context(|| format!("could not open {}", path.display()))?;
        index::index_sequences(reader.transcripts(), store, &mut catalog)
            .with_context(|| format!("could not index {}", path.display()))?;
        simulate::file_stem(path)
    } else if let Some(ref path) = cli.transcripts {
        let transcripts = lists::read_transcripts(lists::open(path)
            .with_context(|| format!("could not open {}", path.display()))?)?;
        index::catalog_stored(&transcripts, &*store, &mut catalog)?;
        simulate::file_stem(path)
    } else if let Some(ref path) = cli.catalog {
        catalog = TripletCountCatalog::load(path)
            .with_context(|| format!("could not load catalog {}", path.display()))?;
        simulate::file_stem(path)
    } else {
        bail!("one of --fasta, --transcripts or --catalog is required");
    };

    if catalog.is_empty() {
        bail!("the count catalog is empty");
    }
    if let Some(ref path) = cli.save_catalog {
        catalog.save(path)?;
        info!("saved catalog to {}", path.display());
    }
    Ok((catalog, name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(&cli)?;
    fs::create_dir_all(&cli.out_dir)?;

    if let Some(ref path) = cli.convert_sbs {
        let column = cli.sbs_column.as_deref().unwrap_or_default();
        let out = cli.out_dir.join(format!("{}.count", column.to_lowercase()));
        signature::convert_file(path, column, SBS_SCALE, &out)
            .with_context(|| format!("could not convert {}", path.display()))?;
        return Ok(());
    }

    let client = EnsemblClient::new(&config.service.url, config.service.timeout())?;
    let resolver = GenomicResolver::new(&client, config.service.batch_size)?
        .with_delay(config.service.delay())
        .with_max_attempts(config.service.max_attempts);
    let extractor = CoordinateExtractor::new(config.chromosomes.clone());

    // pre-resolved coding notations bypass sampling
    if let Some(ref path) = cli.hgvs {
        let descriptors = lists::read_descriptors(lists::open(path)
            .with_context(|| format!("could not open {}", path.display()))?)?;
        let resolved = simulate::resolve_descriptors(&descriptors, &resolver, &extractor);
        let (vcf_path, _) = simulate::write_resolved(&path.with_extension(""), &resolved, &config.output)?;
        info!("{} resolved, {} failed, {} dropped; wrote {}",
            resolved.resolution.resolved.len(), resolved.resolution.failed.len(),
            resolved.dropped, vcf_path.display());
        return Ok(());
    }

    let (Some(db), Some(profile)) = (cli.database.as_ref(), cli.profile.as_ref()) else {
        bail!("--database and --profile are required to simulate");
    };

    let mut store = open_store(cli.store, db)?;
    let (catalog, name) = build_catalog(&cli, &mut *store)?;
    info!("catalog covers {} transcripts", catalog.len());

    let spectrum = FrequencySpectrum::from_file(profile)
        .with_context(|| format!("could not read profile {}", profile.display()))?;
    let sig = simulate::file_stem(profile);

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut sim = Simulator {
        catalog: &catalog,
        indexes: IndexCache::new(&*store),
        resolver,
        extractor,
        tolerance: config.tolerance,
    };

    for k in 1..=cli.runs {
        let out = sim.run(&spectrum, cli.events, &mut rng)
            .with_context(|| format!("run {} of {} failed", k, cli.runs))?;
        let stem = cli.out_dir.join(simulate::run_name(&name, &sig, k, cli.runs));
        simulate::write_run(&stem, &out, &config.output)?;
        info!("run {} of {}: {} resolved, {} failed, {} dropped, {} skipped",
            k, cli.runs, out.resolved.resolution.resolved.len(),
            out.resolved.resolution.failed.len(), out.resolved.dropped, out.skipped.len());
    }

    Ok(())
}
