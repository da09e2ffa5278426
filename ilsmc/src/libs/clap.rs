use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::{ModelArgs, OutputArgs};
use crate::subcommands::{marginals, states, table};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Compute the joint probabilities of the hidden states of two linked loci
    Table {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        /// Write the conditional transition matrix instead of the joint probabilities
        #[arg(long)]
        conditional: bool,

        /// Output the dense matrix as .npy
        #[arg(long)]
        npy: bool,
    },

    /// List the hidden states in their canonical order
    States {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },

    /// Compute the single locus distribution of the hidden states
    Marginals {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Table { threads, .. } | SubCommand::Marginals { threads, .. } => *threads,
            SubCommand::States { .. } => 1,
        }
    }

    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Table { log_and_verbosity, .. }
            | SubCommand::States { log_and_verbosity, .. }
            | SubCommand::Marginals { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }

    #[rustfmt::skip]
    pub fn output(&self) -> Option<PathBuf> {
        match self {
            SubCommand::Table { output, .. }
            | SubCommand::States { output, .. }
            | SubCommand::Marginals { output, .. }
            => (!output.is_stdout()).then(|| output.output.clone()),
        }
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.cmd.threads())
        .build_global()?;

    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    if let Some(output) = args.cmd.output() {
        if let Err(e) = std::fs::create_dir(output.clone()) {
            match e.kind() {
                std::io::ErrorKind::AlreadyExists => (),
                _ => return Err(eyre!("Error creating directory {output:?}")),
            }
        }
    }

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Table { model, output, conditional, npy, .. } => table::run(model, output, conditional, npy)?,
        SubCommand::States { model, output, .. } => states::run(model, output)?,
        SubCommand::Marginals { model, output, .. } => marginals::run(model, output)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, _guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, _guard))
}

pub fn get_styles() -> clap::builder::Styles {
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let red = anstyle::Color::Ansi(anstyle::AnsiColor::Red);

    clap::builder::Styles::styled()
        .usage(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
        .header(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
        .literal(anstyle::Style::new().fg_color(Some(green)))
        .invalid(anstyle::Style::new().bold().fg_color(Some(red)))
        .error(anstyle::Style::new().bold().fg_color(Some(red)))
        .valid(anstyle::Style::new().bold().underline().fg_color(Some(green)))
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
