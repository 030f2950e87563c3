use clap::Parser;
use serde::Serialize;
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tmi::{parse_with_logger, ParsedProgram, ProgramLoader, ProgramManager, TuringMachine};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The machine program file to execute
    program: Option<PathBuf>,

    /// Run one of the bundled programs instead of a file
    #[clap(short, long, conflicts_with = "program")]
    builtin: Option<String>,

    /// List the bundled programs and exit
    #[clap(short, long)]
    list: bool,

    /// Replace the program's initial tape
    #[clap(short, long)]
    tape: Option<String>,

    /// Fail if the machine has not halted after this many steps
    #[clap(short, long)]
    max_steps: Option<u64>,

    /// Print a JSON report (final tape, step count, program and warnings) instead of the
    /// bare tape
    #[clap(long)]
    json: bool,

    /// Log parsing and every step to stderr
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    tape: String,
    steps: u64,
    head: i64,
    #[serde(flatten)]
    parsed: &'a ParsedProgram,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger = if cli.verbose {
        let decorator = TermDecorator::new().stderr().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Discard, o!())
    };

    match run(&cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, logger: &Logger) -> Result<(), Box<dyn Error>> {
    if cli.list {
        for name in ProgramManager::list_program_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let parsed = match (&cli.program, &cli.builtin) {
        (Some(path), _) => ProgramLoader::load_program_with_logger(path, logger.clone())?,
        (None, Some(name)) => {
            let text = ProgramManager::get_program_text_by_name(name)?;
            parse_with_logger(text, logger.clone())?
        }
        (None, None) => return Err("no program given, pass a file or --builtin <NAME>".into()),
    };

    if !cli.json {
        for warning in &parsed.warnings {
            eprintln!("warning: {warning}");
        }
    }

    let mut machine = TuringMachine::with_logger(&parsed.program, logger.clone());
    if let Some(tape) = &cli.tape {
        machine.set_tape_content(tape)?;
    }

    match cli.max_steps {
        Some(limit) => machine.run_with_limit(limit)?,
        None => machine.run()?,
    };

    if cli.json {
        let report = Report {
            tape: machine.tape().to_string(),
            steps: machine.step_count(),
            head: machine.head(),
            parsed: &parsed,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", machine.tape());
    }

    Ok(())
}
