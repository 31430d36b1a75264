use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meshline_core::{Config, LineageConfig, LineageReport};
use meshline_core::config::BUCKET_ENV_VAR;
use meshline_dbt::{
    BatchEntry, LineageOutcome, LineageValidator, Manifest, NodeIdentifier, ReferenceConvention,
};
use meshline_registry::{destination_from_config, publish, RegistryError};

const DEFAULT_CONFIG_FILE: &str = "meshline.toml";

/// meshline - dbt mesh manifest registry and lineage checks
#[derive(Parser)]
#[command(name = "meshline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: meshline.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish target/manifest.json to the mesh registry
    Publish {
        /// Use the local filesystem instead of S3
        #[arg(long)]
        local: bool,

        /// S3 bucket name
        #[arg(long, env = BUCKET_ENV_VAR)]
        bucket: Option<String>,

        /// Environment (dev/staging/prod) [default: prod]
        #[arg(long)]
        env: Option<String>,

        /// Project name for registry paths [default: dbt_up]
        #[arg(long)]
        project: Option<String>,

        /// Local registry base path [default: ../registry]
        #[arg(long)]
        registry_path: Option<PathBuf>,

        /// Path to the compiled manifest
        #[arg(short = 'f', long, default_value = "target/manifest.json")]
        manifest: PathBuf,
    },

    /// Validate cross-project lineage in downstream manifests
    Validate {
        /// Known downstream project to validate (reads <project>/target/manifest.json)
        #[arg(long, value_enum)]
        project: Option<KnownProject>,

        /// Direct path to a manifest.json file
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Upstream project name to look for in lineage [default: dbt_up]
        #[arg(long)]
        upstream: Option<String>,

        /// Validate all known downstream projects
        #[arg(long)]
        all: bool,

        /// Also write a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a default meshline.toml
    Init {
        /// Destination file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Downstream projects of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KnownProject {
    /// Consumes upstream models through dbt-loom
    #[value(name = "dbt_down_loom")]
    DbtDownLoom,

    /// Consumes upstream models as native sources
    #[value(name = "dbt_down")]
    DbtDown,
}

impl KnownProject {
    const ALL: [KnownProject; 2] = [KnownProject::DbtDownLoom, KnownProject::DbtDown];

    fn as_str(&self) -> &'static str {
        match self {
            Self::DbtDownLoom => "dbt_down_loom",
            Self::DbtDown => "dbt_down",
        }
    }
}

fn main() -> Result<()> {
    // .env may carry DBT_MESH_BUCKET; it must be loaded before clap reads env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        tracing::debug!("No config file found, using defaults");
        Config::default()
    };

    match cli.command {
        Commands::Publish { local, bucket, env, project, registry_path, manifest } => {
            let mut registry = config.registry;
            if bucket.is_some() {
                registry.bucket = bucket;
            }
            if let Some(env) = env {
                registry.environment = env;
            }
            if let Some(project) = project {
                registry.project = project;
            }
            if let Some(root) = registry_path {
                registry.root = root;
            }
            publish_command(&registry, local, &manifest)
        }
        Commands::Validate { project, manifest, upstream, all, output } => {
            let mut lineage = config.lineage;
            if let Some(upstream) = upstream {
                lineage.upstream = upstream;
            }
            let selection = Selection { manifest, project, all };
            validate_command(&lineage, &selection, output.as_deref())
        }
        Commands::Init { path, force } => init_command(&path, force),
    }
}

/// Install the stderr log subscriber
///
/// `--verbose` forces debug; otherwise RUST_LOG applies, defaulting to warn.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Publish command - copy the manifest into latest/ and history/
fn publish_command(
    registry: &meshline_core::RegistryConfig,
    local: bool,
    manifest_path: &Path,
) -> Result<()> {
    if !manifest_path.is_file() {
        return Err(RegistryError::ManifestNotFound(manifest_path.to_path_buf()).into());
    }
    println!("{} {}", "Found manifest:".cyan(), manifest_path.display());

    // The public model scan is advisory; the raw bytes are published either way
    match Manifest::from_file(manifest_path) {
        Ok(manifest) => report_public_models(&manifest, manifest_path),
        Err(e) => {
            tracing::warn!(path = %manifest_path.display(), error = %e, "skipping public model scan");
            println!("{} {}", "⚠ Warning: Could not scan manifest for public models:".yellow(), e);
        }
    }

    let destination = destination_from_config(registry, local)?;
    let receipt = publish(
        manifest_path,
        &registry.project,
        &registry.environment,
        destination.as_ref(),
    )?;

    let target = if local { "local registry" } else { "S3 registry" };
    println!("{} {}:", "✓ Published to".green(), target);
    println!("  Latest:  {}", receipt.latest);
    println!("  History: {}", receipt.history);
    println!("  SHA-256: {} ({} bytes)", receipt.sha256, receipt.bytes);
    println!();
    println!("{}", "✓ Manifest published successfully!".green().bold());

    Ok(())
}

fn report_public_models(manifest: &Manifest, manifest_path: &Path) {
    let public_models = manifest.public_models();
    if public_models.is_empty() {
        tracing::warn!(path = %manifest_path.display(), "manifest has no public models");
        println!("{}", "⚠ Warning: No public models found in manifest".yellow());
    } else {
        println!("Found {} public model(s):", public_models.len());
        for model in &public_models {
            println!("  - {}", model);
        }
    }
}

/// Which manifests `validate` should check
struct Selection {
    manifest: Option<PathBuf>,
    project: Option<KnownProject>,
    all: bool,
}

impl Selection {
    /// Manifest paths in precedence order: --manifest, --project, --all
    ///
    /// None when no selection flag was given.
    fn resolve(&self, lineage: &LineageConfig) -> Option<Vec<PathBuf>> {
        if let Some(path) = &self.manifest {
            Some(vec![path.clone()])
        } else if let Some(project) = self.project {
            Some(vec![lineage.manifest_path_for(project.as_str())])
        } else if self.all {
            Some(
                KnownProject::ALL
                    .iter()
                    .map(|p| lineage.manifest_path_for(p.as_str()))
                    .collect(),
            )
        } else {
            None
        }
    }
}

/// Validate command - check cross-project lineage
fn validate_command(lineage: &LineageConfig, selection: &Selection, output: Option<&Path>) -> Result<()> {
    let Some(paths) = selection.resolve(lineage) else {
        eprintln!("{}", "Usage: Specify --project, --manifest, or --all".yellow());
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  meshline validate --project dbt_down_loom");
        eprintln!("  meshline validate --project dbt_down");
        eprintln!("  meshline validate --all");
        eprintln!("  meshline validate --manifest path/to/manifest.json");
        eprintln!();
        if let Some(validate) = Cli::command().find_subcommand_mut("validate") {
            eprintln!("{}", validate.render_help());
        }
        std::process::exit(1);
    };

    if !run_validation(lineage, &paths, output)? {
        std::process::exit(1);
    }

    Ok(())
}

/// Validate `paths`, print the findings and summary, and write the report
///
/// Returns whether every manifest passed.
fn run_validation(lineage: &LineageConfig, paths: &[PathBuf], output: Option<&Path>) -> Result<bool> {
    let validator = LineageValidator::new(lineage.upstream.clone());
    let batch = validator.validate_batch(paths);

    let mut report = LineageReport::new(validator.upstream());
    for entry in &batch.entries {
        print_entry(entry, validator.upstream());
        report.add_result(entry.to_result());
    }

    print_summary(&report);

    if let Some(path) = output {
        report.save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("{} {}", "Report saved to:".green(), path.display());
    }

    Ok(batch.all_passed())
}

/// Last segment of a unique_id, or the whole id if it is not dotted
fn short_name(unique_id: &str) -> &str {
    NodeIdentifier::parse(unique_id).map_or(unique_id, |id| id.name)
}

/// Print one manifest's findings
fn print_entry(entry: &BatchEntry, upstream: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());

    let validation = match &entry.result {
        Ok(validation) => validation,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return;
        }
    };

    println!("Validating lineage for project: {}", validation.project_name.bold());
    println!("Manifest path: {}", entry.path.display());
    println!("Looking for references to: {}", upstream);
    println!("{}", "-".repeat(60));

    if validation.outcome == LineageOutcome::Missing {
        println!(
            "\n{} No cross-project references to '{}' found in manifest",
            "✗".red(),
            upstream
        );
        return;
    }

    println!(
        "\n{} Found {} model(s) with {} cross-project reference(s):\n",
        "✓".green(),
        validation.all_refs.len(),
        validation.all_refs.edge_count()
    );
    for (node_id, parents) in validation.all_refs.iter() {
        println!("  {}:", short_name(node_id));
        for parent in parents {
            let via = ReferenceConvention::detect(parent, upstream)
                .map(|convention| format!(" via {convention}"))
                .unwrap_or_default();
            println!(
                "    └── {} (upstream: {}{})",
                parent,
                short_name(parent).yellow(),
                via
            );
        }
    }

    match validation.outcome {
        LineageOutcome::Validated => println!(
            "\n{} parent_map contains {} references - DAG lineage preserved!",
            "✓".green(),
            upstream
        ),
        _ => println!(
            "\n{}",
            "⚠ depends_on has refs but parent_map is missing - partial lineage".yellow()
        ),
    }
}

/// Print the PASS/FAIL table
fn print_summary(report: &LineageReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "VALIDATION SUMMARY".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());

    for result in &report.results {
        let status = if result.passed {
            "✓ PASS".green().bold()
        } else {
            "✗ FAIL".red().bold()
        };
        println!("{}: {} - {}", status, result.project, result.diagnostic.message);
    }

    println!();
    println!(
        "Checked: {}  Passed: {}  Failed: {}  Partial: {}",
        report.summary.checked, report.summary.passed, report.summary.failed, report.summary.partial
    );

    if report.all_passed() {
        println!("\n{}", "✓ All lineage validations passed!".green().bold());
    } else {
        println!("\n{}", "✗ Some validations failed - check output above".red().bold());
    }
}

/// Init command - write a default config file
fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }

    Config::default().save_to_file(path)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
