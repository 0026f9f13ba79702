//! DDT engine command line
//!
//! ```bash
//! # Assemble a raw descriptor (JSON or YAML) into a canonical DDT
//! ddt-engine assemble raw/date_of_birth.yaml --id dob --out dob.json
//!
//! # Assemble and store it in the configured DDT directory
//! ddt-engine assemble raw/date_of_birth.yaml --publish
//!
//! # Check structure and run constraint test sets
//! ddt-engine validate dob.json
//!
//! # Talk to a DDT on stdin with the rule-based parser
//! ddt-engine simulate dob.json
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use ddt_engine::adapters::{JsonFileDdtRepository, RuleBasedParser};
use ddt_engine::application::DdtService;
use ddt_engine::config::{AppConfig, LoggingConfig, CONFIG_FILE};
use ddt_engine::domain::assembler::{AssemblyRequest, DdtAssembler};
use ddt_engine::domain::constraint::{self_test, EvalContext};
use ddt_engine::domain::ddt::{validate, Ddt, ValidatedDdt};
use ddt_engine::domain::foundation::RandomIds;
use ddt_engine::domain::runtime::{DialogueEngine, Speaker};
use ddt_engine::domain::simulator::{Simulator, TranscriptEntry};

#[derive(Parser)]
#[command(name = "ddt-engine")]
#[command(version)]
#[command(about = "Assemble, validate and simulate Dialogue Data Templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (format from extension)
    #[arg(long, short, global = true, default_value = CONFIG_FILE)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a raw descriptor into a canonical DDT
    Assemble {
        /// Raw assembly request (.json, .yaml or .yml)
        input: PathBuf,

        /// Pin the DDT id
        #[arg(long)]
        id: Option<String>,

        /// Write the DDT here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Store the DDT in the configured DDT directory
        #[arg(long, conflicts_with = "out")]
        publish: bool,
    },

    /// Validate a DDT and run its constraint test sets
    Validate {
        /// DDT JSON file
        ddt: PathBuf,
    },

    /// Run an interactive session on stdin
    Simulate {
        /// DDT JSON file
        ddt: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AppConfig::load_from(&cli.config).context("loading configuration")?;
    config.validate().context("invalid configuration")?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Assemble {
            input,
            id,
            out,
            publish,
        } => assemble(&config, &input, id, out, publish).await,
        Commands::Validate { ddt } => validate_file(&ddt),
        Commands::Simulate { ddt } => simulate(&config, &ddt).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter())
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_request(path: &Path) -> Result<AssemblyRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let request = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing YAML {}", path.display()))?,
        _ => serde_json::from_str(&raw)
            .with_context(|| format!("parsing JSON {}", path.display()))?,
    };
    Ok(request)
}

fn read_ddt(path: &Path) -> Result<ValidatedDdt> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let ddt: Ddt =
        serde_json::from_str(&raw).with_context(|| format!("parsing DDT {}", path.display()))?;
    Ok(validate(ddt)?)
}

async fn assemble(
    config: &AppConfig,
    input: &Path,
    id: Option<String>,
    out: Option<PathBuf>,
    publish: bool,
) -> Result<()> {
    let mut request = read_request(input)?;
    if id.is_some() {
        request.ddt_id = id;
    }
    let assembler = DdtAssembler::new(config.assembler.action_policy()?);

    if publish {
        let service = DdtService::new(
            Arc::new(JsonFileDdtRepository::new(&config.storage.ddt_dir)),
            Arc::new(RuleBasedParser::new()),
            assembler,
            config.runtime.engine_config(),
        );
        let ddt = service.publish(request).await?;
        println!("{}", ddt.id);
        return Ok(());
    }

    let ddt = validate(assembler.assemble(request, &mut RandomIds)?)?;
    let json = serde_json::to_string_pretty(&*ddt)?;
    match out {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn validate_file(path: &Path) -> Result<()> {
    let ddt = read_ddt(path)?;
    let ctx = EvalContext::default();
    let mut failures = 0;

    ddt.main_data.walk(&ddt.root_id(), &mut |node_id, node| {
        for constraint in &node.constraints {
            for outcome in self_test(constraint, &ctx).iter().filter(|o| !o.passed()) {
                failures += 1;
                println!(
                    "{} {}: {} -> {} (expected {})",
                    node_id, constraint.id, outcome.case.input, outcome.actual, outcome.case.expected
                );
            }
        }
    });

    if failures > 0 {
        bail!("{} constraint test case(s) failed", failures);
    }
    println!("{}: {} node(s), OK", ddt.id, ddt.node_ids().len());
    Ok(())
}

fn print_entries(entries: &[TranscriptEntry]) {
    for entry in entries {
        match entry.from {
            Speaker::Bot => println!("bot> {}", entry.text),
            Speaker::System => println!("-- {}", entry.text),
            Speaker::User => {}
        }
    }
}

async fn simulate(config: &AppConfig, path: &Path) -> Result<()> {
    let ddt = Arc::new(read_ddt(path)?);
    let engine = DialogueEngine::new(
        ddt,
        Arc::new(RuleBasedParser::new()),
        config.runtime.engine_config(),
    );
    let mut simulator = Simulator::init(engine, config.runtime.simulator_config())?;
    print_entries(simulator.transcript());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !simulator.is_complete() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let entries = simulator.send_input(&line).await?;
        print_entries(entries);
    }

    for (node_id, progress) in &simulator.state().nodes {
        if !progress.variables.is_empty() {
            println!("{} = {}", node_id, serde_json::to_string(&progress.variables)?);
        }
    }
    Ok(())
}
