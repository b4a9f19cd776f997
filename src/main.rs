//=====================================================
// File: main.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script CLI entry point
// Objective: Command-line interface for dumping tokens from script source and
//            executing parser-produced AST programs with runtime options
//=====================================================

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use buddyscript::interpreter::ScriptError;
use buddyscript::{Interpreter, Program, ScriptConfig, ScriptResult, Tokenizer};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "buddyscript", about = "Buddy Script CLI")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tokenize a script source file.
    Tokens(TokensArgs),
    /// Execute a parsed program (JSON AST in either dialect).
    Run(RunArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TokensArgs {
    /// Script source file.
    pub source: PathBuf,

    /// Emit tokens as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Program JSON produced by the parser.
    pub program: PathBuf,

    /// TOML configuration file; defaults to the user config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wall-clock budget in milliseconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Run `test` blocks and report their results.
    #[arg(long)]
    pub verbose: bool,

    /// Ask bindings to simulate side effects.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Working directory handed to bindings.
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Print the full ScriptResult as JSON.
    #[arg(long)]
    pub json: bool,
}

fn main() -> Result<ExitCode> {
    install_tracing();
    let args = Args::parse();

    let success = match args.command {
        Command::Tokens(cmd) => dump_tokens(&cmd)?,
        Command::Run(cmd) => run_entry(&cmd)?,
    };
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn install_tracing() {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Ok(directive) = "buddyscript=info".parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dump_tokens(args: &TokensArgs) -> Result<bool> {
    let source = fs::read_to_string(&args.source)
        .with_context(|| format!("reading script {}", args.source.display()))?;
    let tokens = match Tokenizer::new(&source).tokenize() {
        Ok(tokens) => tokens,
        Err(err) => {
            let err = ScriptError::from(err);
            eprintln!("error[{}]: {}", err.code_str(), err.message);
            return Ok(false);
        }
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(true);
    }
    for token in &tokens {
        match &token.literal {
            Some(literal) => println!(
                "{:>4}:{:<4} {:?} {}",
                token.line,
                token.column,
                token.kind,
                serde_json::to_string(literal)?
            ),
            None => println!("{:>4}:{:<4} {:?}", token.line, token.column, token.kind),
        }
    }
    Ok(true)
}

fn load_config(args: &RunArgs) -> Result<ScriptConfig> {
    let mut config = match &args.config {
        Some(path) => ScriptConfig::load(path)?,
        None => ScriptConfig::load_default().context("loading default configuration")?,
    };
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(workdir) = &args.workdir {
        config = config.with_workdir(workdir.clone());
    }
    if args.verbose {
        config = config.with_verbose(true);
    }
    if args.dry_run {
        config = config.with_dry_run(true);
    }
    Ok(config)
}

fn run_entry(args: &RunArgs) -> Result<bool> {
    let config = load_config(args)?;
    let text = fs::read_to_string(&args.program)
        .with_context(|| format!("reading program {}", args.program.display()))?;
    let program = Program::from_json(&text)
        .with_context(|| format!("parsing program {}", args.program.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let mut interpreter = Interpreter::new(config);
    let result = runtime.block_on(interpreter.execute(&program));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(result.success)
}

fn print_result(result: &ScriptResult) {
    for line in &result.output {
        println!("{line}");
    }
    if let Some(tests) = &result.test_results {
        let failed = result.failed_tests().count();
        println!("{} passed, {} failed", tests.len() - failed, failed);
    }
    if let Some(value) = &result.return_value {
        println!("=> {}", value.repr());
    }
    if let Some(error) = &result.error {
        eprintln!("error: {error}");
    }
}

//=====================================================
// End of file
//=====================================================
