//! clana-rs CLI for reordering and grouping confusion matrices.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clana::analysis::{find_problems, top_confusions, ReorderingReport};
use clana::cluster::{ClusterConfig, FlatCut, Linkage};
use clana::core::{ConfusionMatrix, LabelSet, Permutation};
use clana::optimize::{optimize_multi_start_from, OptimizerConfig};

#[derive(Parser)]
#[command(name = "clana")]
#[command(author, version)]
#[command(about = "Reorder a confusion matrix so that confused classes sit together")]
#[command(long_about = "clana-rs: confusion matrix reordering and class grouping.

EXAMPLES:
  # Reorder a matrix and print the report
  clana optimize --cm cm.json --labels labels.txt

  # More steps, several restarts, and two groups
  clana optimize --cm cm.json --steps 500000 --restarts 4 --clusters 2

  # Store the ordering and continue from it later
  clana optimize --cm cm.json --save-perm perm.json --output result.json
  clana optimize --cm cm.json --perm perm.json --save-perm perm.json

  # A full result file also works as a starting ordering
  clana optimize --cm cm.json --perm result.json

  # Check for classes that never occur or are never predicted
  clana problems --cm cm.json --labels labels.txt")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the label order and optionally group the labels
    Optimize {
        /// Confusion matrix as a JSON 2-D array
        #[arg(long, value_name = "FILE")]
        cm: PathBuf,

        /// Label names, one per line
        #[arg(long, value_name = "FILE")]
        labels: Option<PathBuf>,

        /// Starting permutation: a JSON array, or a result file from --output
        #[arg(long, value_name = "FILE")]
        perm: Option<PathBuf>,

        /// Write the best permutation as a JSON array
        #[arg(long, value_name = "FILE")]
        save_perm: Option<PathBuf>,

        /// JSON config with optional "optimizer" and "cluster" sections
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Maximum optimizer iterations
        #[arg(long, value_name = "N")]
        steps: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Independent restarts, run in parallel
        #[arg(long, default_value = "1", value_name = "R")]
        restarts: usize,

        /// Cut the class tree into this many groups
        #[arg(long, value_name = "K", conflicts_with = "threshold")]
        clusters: Option<usize>,

        /// Cut the class tree at this linkage distance
        #[arg(long, value_name = "T")]
        threshold: Option<f64>,

        /// Linkage rule: single, complete, average
        #[arg(long, value_name = "RULE")]
        linkage: Option<String>,

        /// Write the JSON result here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List structural problems and the most frequent confusions
    Problems {
        /// Confusion matrix as a JSON 2-D array
        #[arg(long, value_name = "FILE")]
        cm: PathBuf,

        /// Label names, one per line
        #[arg(long, value_name = "FILE")]
        labels: Option<PathBuf>,

        /// Number of confusions to list
        #[arg(long, default_value = "10", value_name = "K")]
        top: usize,
    },
}

/// Contents of `--config`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    optimizer: OptimizerConfig,
    cluster: ClusterConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Optimize {
            cm,
            labels,
            perm,
            save_perm,
            config,
            steps,
            seed,
            restarts,
            clusters,
            threshold,
            linkage,
            output,
        } => {
            let mut run = match config {
                Some(path) => read_json::<RunConfig>(&path)?,
                None => RunConfig::default(),
            };
            if let Some(steps) = steps {
                run.optimizer.max_iterations = steps;
            }
            if let Some(seed) = seed {
                run.optimizer = run.optimizer.with_seed(seed);
            }
            if let Some(name) = linkage {
                run.cluster.linkage = name.parse::<Linkage>()?;
            }
            if let Some(k) = clusters {
                run.cluster.cut = Some(FlatCut::ClusterCount(k));
            }
            if let Some(t) = threshold {
                run.cluster.cut = Some(FlatCut::DistanceThreshold(t));
            }
            let paths = OptimizePaths {
                cm,
                labels,
                perm,
                save_perm,
                output,
            };
            handle_optimize(&paths, &run, restarts)
        }
        Commands::Problems { cm, labels, top } => handle_problems(&cm, labels.as_deref(), top),
    }
}

/// Files read and written by `clana optimize`.
struct OptimizePaths {
    cm: PathBuf,
    labels: Option<PathBuf>,
    perm: Option<PathBuf>,
    save_perm: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn handle_optimize(paths: &OptimizePaths, run: &RunConfig, restarts: usize) -> Result<()> {
    let (cm, labels) = load_inputs(&paths.cm, paths.labels.as_deref())?;

    // Reject bad settings before the search starts.
    run.optimizer.validate().context("Invalid optimizer configuration")?;
    run.cluster
        .validate_for(&cm)
        .context("Invalid cluster configuration")?;

    let start = match &paths.perm {
        Some(path) => {
            let perm = read_permutation(path)?;
            if perm.len() != cm.size() {
                bail!(
                    "Permutation in '{}' has {} entries, matrix has {} labels",
                    path.display(),
                    perm.len(),
                    cm.size()
                );
            }
            perm
        }
        None => Permutation::identity(cm.size()),
    };

    find_problems(&cm, &labels)?;

    let multi = optimize_multi_start_from(&cm, &run.optimizer, restarts, &start)
        .context("Optimization failed")?;
    let result = &multi.best;

    let clustering = run
        .cluster
        .cluster(&cm, Some(&result.permutation))
        .context("Clustering failed")?;
    if clustering.flat.is_none() {
        tracing::info!("No cut configured; pass --clusters or --threshold to group labels");
    }

    let report = ReorderingReport::new(&cm, &labels, result, clustering.flat.as_ref())?;
    println!("{}", report.to_string_table());

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "report": report,
        "optimization": result,
        "restart_costs": multi.costs,
        "dendrogram": clustering.dendrogram,
    }))?;
    match &paths.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(path) = &paths.save_perm {
        let perm = serde_json::to_string(&result.permutation)?;
        std::fs::write(path, perm)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        println!("Permutation written to {}", path.display());
    }
    Ok(())
}

fn handle_problems(cm_path: &Path, labels_path: Option<&Path>, top: usize) -> Result<()> {
    let (cm, labels) = load_inputs(cm_path, labels_path)?;

    let problems = find_problems(&cm, &labels)?;
    if problems.is_empty() {
        println!("No structural problems found.");
    } else {
        println!("Problems:");
        for p in &problems {
            println!("  {}", p);
        }
    }

    println!("\nTop confusions (true -> predicted):");
    for c in top_confusions(&cm, top) {
        let name = |i: usize| labels.get(i).unwrap_or_default();
        println!("  {:>8}  {} -> {}", c.count, name(c.target), name(c.pred));
    }
    println!("\nAccuracy: {:.2}%", cm.accuracy() * 100.0);
    Ok(())
}

fn load_inputs(cm_path: &Path, labels_path: Option<&Path>) -> Result<(ConfusionMatrix, LabelSet)> {
    let cm: ConfusionMatrix = read_json(cm_path)?;
    let labels = match labels_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read labels '{}'", path.display()))?;
            LabelSet::from_lines(&text)
                .with_context(|| format!("Failed to parse labels '{}'", path.display()))?
        }
        None => LabelSet::numbered(cm.size()),
    };
    labels.check_matches(&cm)?;
    tracing::info!("Loaded {} x {} confusion matrix", cm.size(), cm.size());
    Ok((cm, labels))
}

/// Read a starting order from either a bare JSON array or the
/// `optimization.permutation` field of a result written by `--output`.
fn read_permutation(path: &Path) -> Result<Permutation> {
    let value: serde_json::Value = read_json(path)?;
    let perm = match value.pointer("/optimization/permutation") {
        Some(nested) => nested.clone(),
        None => value,
    };
    serde_json::from_value(perm)
        .with_context(|| format!("No valid permutation in '{}'", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}
