use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use groupmaps::{
    build_group_map, merge_from_list, replicate, run_argument, score_correlation, score_dice, AssignmentTable,
    Catalog, Config, DryRunRunner, JobArgument, ProcessRunner, ToolRunner,
};

#[derive(Parser, Debug)]
#[command(name = "groupmaps", author, version)]
#[command(about = "Bootstrap group maps for resting-state networks and their similarity to a prior")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print external tool invocations instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize the runs found below a directory
    Catalog {
        root: PathBuf,
        /// File name suffix of the maps to catalog
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Copy cataloged runs into bootstrap group directories
    Replicate {
        /// Directory holding the per-run maps
        catalog_root: PathBuf,
        /// Resampling table, one column per group
        assignment: PathBuf,
        /// Directory receiving one subdirectory per group
        out_root: PathBuf,
    },
    /// Merge, average and test the maps in one group directory
    GroupMap {
        dir: PathBuf,
        #[arg(long)]
        component: Option<u32>,
        #[arg(long)]
        permutations: Option<u32>,
        /// Accept existing outputs that have no completion marker
        #[arg(long)]
        trust_existing: bool,
    },
    /// Cluster entry point: a JSON job object or a group directory
    Job { argument: String },
    /// Merge the files listed in the first column of a CSV file
    MergeList {
        list: PathBuf,
        output: PathBuf,
        #[arg(long)]
        component: Option<u32>,
    },
    /// Dice overlap of group maps with a prior network
    Dice {
        #[arg(long)]
        prior: Option<PathBuf>,
        dirs: Vec<PathBuf>,
        #[arg(long)]
        z_prior: Option<f64>,
        #[arg(long)]
        z_group: Option<f64>,
    },
    /// Amplitude correlation of group maps with a prior network
    Correlate {
        #[arg(long)]
        prior: Option<PathBuf>,
        dirs: Vec<PathBuf>,
        #[arg(long)]
        z_prior: Option<f64>,
    },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let directive = if verbose { "groupmaps=debug" } else { "groupmaps=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn apply_scoring_overrides(
    cfg: &mut Config,
    prior: Option<PathBuf>,
    dirs: Vec<PathBuf>,
    z_prior: Option<f64>,
    z_group: Option<f64>,
) {
    if prior.is_some() {
        cfg.scoring.prior = prior;
    }
    if !dirs.is_empty() {
        cfg.scoring.dirs = dirs;
    }
    if let Some(z) = z_prior {
        cfg.scoring.z_prior = z;
    }
    if let Some(z) = z_group {
        cfg.scoring.z_group = z;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let mut runner: Box<dyn ToolRunner> = if cli.dry_run {
        Box::new(DryRunRunner::default())
    } else {
        Box::new(ProcessRunner)
    };

    match cli.command {
        Commands::Catalog { root, suffix } => {
            let suffix = suffix.unwrap_or_else(|| cfg.replication.catalog_suffix.clone());
            let catalog = Catalog::scan(&root, &suffix)?;
            for subject in catalog.subjects() {
                for session in catalog.sessions(subject) {
                    let runs = catalog.runs(subject, session);
                    println!("{}\t{}\t{} runs\t{}", subject, session, runs.len(), runs.join(","));
                }
            }
            println!("{} runs in total", catalog.len());
        }
        Commands::Replicate {
            catalog_root,
            assignment,
            out_root,
        } => {
            let catalog = Catalog::scan(&catalog_root, &cfg.replication.catalog_suffix)?;
            let table = AssignmentTable::from_path(&assignment)?;
            let report = replicate(&catalog, &table, &out_root, &cfg.replication.archive_extension)?;
            for (group, key) in &report.missing {
                println!("missing\t{}\t{}", group, key);
            }
        }
        Commands::GroupMap {
            dir,
            component,
            permutations,
            trust_existing,
        } => {
            if let Some(c) = component {
                cfg.group_map.component = c;
            }
            if let Some(n) = permutations {
                cfg.group_map.permutations = n;
            }
            cfg.group_map.trust_existing_outputs |= trust_existing;
            cfg.validate()?;
            let outcome = build_group_map(&dir, &cfg.group_map, runner.as_mut())?;
            println!("{}", outcome.paths.zmap.display());
        }
        Commands::Job { argument } => {
            let arg = JobArgument::parse(&argument)?;
            let report = run_argument(&arg, &cfg, runner.as_mut())?;
            for outcome in &report.group_maps {
                println!("{}", outcome.paths.zmap.display());
            }
        }
        Commands::MergeList {
            list,
            output,
            component,
        } => {
            if let Some(c) = component {
                cfg.group_map.component = c;
            }
            merge_from_list(&list, &output, &cfg.group_map, runner.as_mut())?;
        }
        Commands::Dice {
            prior,
            dirs,
            z_prior,
            z_group,
        } => {
            apply_scoring_overrides(&mut cfg, prior, dirs, z_prior, z_group);
            let report = score_dice(&cfg.scoring)?;
            println!("{} maps scored, {} skipped", report.scored, report.failed.len());
        }
        Commands::Correlate { prior, dirs, z_prior } => {
            apply_scoring_overrides(&mut cfg, prior, dirs, z_prior, None);
            let report = score_correlation(&cfg.scoring)?;
            println!("{} maps scored, {} skipped", report.scored, report.failed.len());
        }
    }

    Ok(())
}
