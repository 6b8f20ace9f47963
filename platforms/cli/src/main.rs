use aqua::types::{COMPILED_EXTENSION, SOURCE_EXTENSION};
use aqua::{
    compile_file_to_table, encode_json, AquaError, Config, Halt, Machine, ProgramLoader, Step,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// A source file (.aquasrc) to compile or a compiled table (.aquacomp) to execute
    file: PathBuf,

    /// Additional directory to search for compiled modules
    #[clap(short, long)]
    search_path: Option<PathBuf>,

    /// Only report warnings and errors
    #[clap(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Report more details, repeat for every rule
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Initial tape contents, e.g. 0110
    #[clap(short, long)]
    tape: Option<String>,

    /// Initial head position on the tape
    #[clap(long, default_value_t = 0)]
    head: usize,

    /// Output format of the compiled program
    #[clap(short, long, value_enum, default_value = "table")]
    format: Format,

    /// Configuration file, defaults to ./aqua.toml
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.quiet {
        config.compiler.verbosity = 0;
    } else if cli.verbose > 0 {
        config.compiler.verbosity = cli.verbose.saturating_add(1);
    }
    init_logging(config.log_level());

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given level, `RUST_LOG` takes precedence.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run(cli: &Cli, config: &Config) -> Result<(), AquaError> {
    let extension = cli.file.extension().and_then(|ext| ext.to_str());

    match extension {
        Some(SOURCE_EXTENSION) => compile(cli, config),
        Some(COMPILED_EXTENSION) => execute(cli, config),
        _ => Err(AquaError::FileError(format!(
            "{} is neither a .{} source nor a .{} table",
            cli.file.display(),
            SOURCE_EXTENSION,
            COMPILED_EXTENSION
        ))),
    }
}

fn compile(cli: &Cli, config: &Config) -> Result<(), AquaError> {
    let search_path = cli
        .search_path
        .as_deref()
        .or(config.compiler.search_path.as_deref());

    let (compilation, output) = compile_file_to_table(&cli.file, search_path)?;
    tracing::info!(
        path = %output.display(),
        rules = compilation.program.rules.len(),
        "table written"
    );

    if cli.format == Format::Json {
        println!("{}", encode_json(&compilation.program)?);
    }

    Ok(())
}

fn execute(cli: &Cli, config: &Config) -> Result<(), AquaError> {
    let program = ProgramLoader::load_program(Path::new(&cli.file))?;
    let tape = cli.tape.as_deref().unwrap_or(&config.machine.tape);

    let mut machine = Machine::new(program).with_max_steps(config.machine.max_steps);
    machine.set_tape(tape, cli.head)?;

    print_state(&machine);
    match machine.run_with(print_state) {
        Step::Halt(Halt::Err(e)) => return Err(e),
        Step::Halt(Halt::StepLimit) => {
            tracing::warn!(steps = machine.step_count(), "step limit reached")
        }
        _ => print_state(&machine),
    }

    println!("\n{}", machine.tape_string());
    Ok(())
}

fn print_state(machine: &Machine) {
    println!(
        "Step: {}, State: {}, Tape: {}, Head: {}",
        machine.step_count(),
        machine.state(),
        machine.tape_string(),
        machine.head()
    );
}
