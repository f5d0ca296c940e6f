//! MiniNet CLI
//!
//! - `mininet import` validates the people and relations files into a snapshot
//!   (or reuses the snapshot when the files are gone)
//! - `mininet profiles` / `mininet relations <name>` read the snapshot

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use mininet_ingest::{run_import, Diagnostic, ImportConfig, ImportError, ImportOutcome};
use mininet_store::{MemoryRepository, Repository};

#[derive(Parser)]
#[command(name = "mininet")]
#[command(author, version, about = "MiniNet: validated profile and relation import")]
struct Cli {
    /// Log loader and sweep details (DEBUG level)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the snapshot from the input files, or reuse it if they are missing.
    Import {
        #[command(flatten)]
        store: StoreArgs,
        /// People file (overrides the config)
        #[arg(long)]
        people: Option<PathBuf>,
        /// Relations file (overrides the config)
        #[arg(long)]
        relations: Option<PathBuf>,
    },
    /// List every stored profile.
    Profiles {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List the relations of one profile.
    Relations {
        name: String,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// JSON config file (people_path, relations_path, snapshot_path)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Snapshot file (overrides the config)
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl StoreArgs {
    fn resolve(&self) -> Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ImportConfig::default(),
        };
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = snapshot.clone();
        }
        Ok(config)
    }

    fn open(&self) -> Result<MemoryRepository> {
        let config = self.resolve()?;
        MemoryRepository::load_snapshot(&config.snapshot_path).with_context(|| {
            format!(
                "reading snapshot {} (run `mininet import` first)",
                config.snapshot_path.display()
            )
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import {
            store,
            people,
            relations,
        } => {
            let mut config = store.resolve()?;
            if let Some(people) = people {
                config.people_path = people;
            }
            if let Some(relations) = relations {
                config.relations_path = relations;
            }
            cmd_import(&config)
        }
        Commands::Profiles { store } => cmd_profiles(&store.open()?),
        Commands::Relations { name, store } => cmd_relations(&store.open()?, &name),
    }
}

fn print_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        let marker = match diagnostic {
            Diagnostic::ProfilesDeleted { .. } => "deleted".red().bold(),
            _ => "skipped".yellow().bold(),
        };
        println!("{marker} {diagnostic}");
    }
}

fn cmd_import(config: &ImportConfig) -> Result<()> {
    match run_import(config) {
        Ok(ImportOutcome::Rebuilt {
            repository,
            diagnostics,
            summary,
        }) => {
            print_diagnostics(diagnostics.iter());
            println!(
                "{} {} ({} profiles, {} relations)",
                "rebuilt".green().bold(),
                config.snapshot_path.display().to_string().bold(),
                repository.profiles().len(),
                repository.relations().len()
            );
            println!("  {} {summary}", "→".yellow());
            Ok(())
        }
        Ok(ImportOutcome::Reused { repository }) => {
            println!(
                "{} {} ({} profiles, {} relations)",
                "reused".green().bold(),
                config.snapshot_path.display().to_string().bold(),
                repository.profiles().len(),
                repository.relations().len()
            );
            Ok(())
        }
        Err(ImportError::CorruptedInput {
            file,
            source,
            diagnostics,
        }) => {
            print_diagnostics(diagnostics.iter());
            Err(anyhow!(source).context(format!("'{file}' file is corrupted")))
        }
        Err(err @ ImportError::MissingInputs) => Err(anyhow!(err).context(format!(
            "looked for {}, {} and {}",
            config.people_path.display(),
            config.relations_path.display(),
            config.snapshot_path.display()
        ))),
        Err(err) => Err(err.into()),
    }
}

fn cmd_profiles(repo: &MemoryRepository) -> Result<()> {
    let profiles = repo.profiles();
    if profiles.is_empty() {
        println!("{}", "no profiles".yellow());
        return Ok(());
    }
    for profile in profiles {
        println!(
            "{:<16} {:>3} {} {:<3} {:<10} {}",
            profile.name.bold(),
            profile.age,
            profile.gender,
            profile.state,
            profile.status,
            profile.image
        );
    }
    Ok(())
}

fn cmd_relations(repo: &MemoryRepository, name: &str) -> Result<()> {
    if !repo.exists(name) {
        return Err(anyhow!("no profile named `{name}`"));
    }
    let relations = repo.relations_of(name);
    if relations.is_empty() {
        println!("{} has no relations", name.bold());
        return Ok(());
    }
    for relation in relations {
        let other = relation.partner_of(name).unwrap_or(name);
        let arrow = if relation.first == name { "→" } else { "←" };
        println!("{:<12} {} {}", relation.kind.to_string().cyan(), arrow, other);
    }
    Ok(())
}
