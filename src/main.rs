use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vpc_topology::config::DEFAULT_CONFIG_FILE;
use vpc_topology::error::PlanError;
use vpc_topology::output::write_plan_file;
use vpc_topology::provision::{DryRunAdapter, OutputFormat, ProvisioningAdapter};

/// Plan a VPC layout and transit gateway routing for one environment.
#[derive(Parser, Debug)]
#[command(name = "vpc-plan", version)]
struct Cli {
    /// Environment block to plan (dev, stage, prod ...).
    #[arg(short, long, env = "ENV_NAME", default_value = "dev")]
    env: String,

    /// CDK-style context file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also write the JSON plan into this directory.
    #[arg(short, long)]
    write: Option<PathBuf>,

    #[arg(long, default_value = "log4rs.yml")]
    log_config: PathBuf,
}

fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_config);
    log::info!("#Start main() env={}", cli.env);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<(), PlanError> {
    let plan = vpc_topology::plan_from_file(&cli.config, &cli.env)?;

    let stdout = std::io::stdout();
    let mut adapter = DryRunAdapter::new(stdout.lock(), cli.format);
    let outputs = adapter.provision(&plan)?;
    for (name, value) in &outputs {
        log::info!("output {name} = {value}");
    }

    if let Some(dir) = &cli.write {
        write_plan_file(&plan, dir)?;
    }
    Ok(())
}

fn exit_code(e: &PlanError) -> u8 {
    match e {
        PlanError::Config(_) => 2,
        PlanError::Topology(_) => 3,
        PlanError::Provision(_) => 4,
    }
}

/// Use the log4rs file when present, else warnings to stderr.
fn init_logging(log_config: &Path) {
    match log4rs::init_file(log_config, Default::default()) {
        Ok(()) => return,
        Err(e) => eprintln!(
            "cannot load {}: {e}; logging warnings to stderr",
            log_config.display()
        ),
    }
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
    let fallback = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    match fallback {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("logging disabled: {e}");
            }
        }
        Err(e) => eprintln!("logging disabled: {e}"),
    }
}
