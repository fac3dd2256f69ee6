//! sox command - socket options of other processes.
//!
//! Reads and writes TCP socket options on sockets owned by running
//! processes, addressed by pid and descriptor number.

mod output;
mod parse;

use std::io;
use std::os::fd::RawFd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sox::{OptionRegistry, SockOpt};

use output::{Options, OutputFormat, OutputOptions, Printable, Sockets};

#[derive(Parser)]
#[command(
    name = "sox",
    version,
    about = "Inspect and modify TCP socket options of running processes"
)]
struct Cli {
    /// Output in JSON format.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Output in YAML format.
    #[arg(short = 'y', long, global = true, conflicts_with = "json")]
    yaml: bool,

    /// Pretty print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging.
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read one socket option
    Get {
        /// Process owning the socket
        pid: libc::pid_t,
        /// Descriptor number in that process
        fd: RawFd,
        /// Option name, e.g. TCP_NODELAY
        option: String,
    },

    /// Write one socket option and show the resulting value
    Set {
        /// Process owning the socket
        pid: libc::pid_t,
        /// Descriptor number in that process
        fd: RawFd,
        /// Option name, e.g. TCP_KEEPIDLE
        option: String,
        /// New value (decimal, 0x hex or 0 octal)
        #[arg(allow_hyphen_values = true, value_parser = parse::parse_value)]
        value: i64,
    },

    /// Read every known socket option
    List {
        /// Process owning the socket
        pid: libc::pid_t,
        /// Descriptor number in that process
        fd: RawFd,
        /// Include options that could not be read
        #[arg(short = 'a', long)]
        all: bool,
    },

    /// Show the known socket options
    Options,

    /// Show TCP sockets and the processes holding them
    Sockets {
        /// Only sockets held by this process
        #[arg(short = 'p', long)]
        pid: Option<libc::pid_t>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else if cli.yaml {
        OutputFormat::Yaml
    } else {
        OutputFormat::Text
    };

    let mut opts = OutputOptions {
        pretty: cli.pretty,
        all: false,
    };

    let registry = OptionRegistry::new();

    if let Err(e) = run(cli.command, &registry, format, &mut opts) {
        eprintln!("Error: {:#}", e);
        if e
            .downcast_ref::<sox::Error>()
            .is_some_and(sox::Error::is_permission_denied)
        {
            eprintln!(
                "Hint: access to another process's descriptors needs ptrace permission; \
                 retry as root or with CAP_SYS_PTRACE"
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run(
    command: Command,
    registry: &OptionRegistry,
    format: OutputFormat,
    opts: &mut OutputOptions,
) -> anyhow::Result<()> {
    let sockopt = SockOpt::new(registry);
    let mut stdout = io::stdout().lock();

    match command {
        Command::Get { pid, fd, option } => {
            let result = sockopt.get_option(pid, fd, &option)?;
            result.print(&mut stdout, format, opts)?;
        }
        Command::Set {
            pid,
            fd,
            option,
            value,
        } => {
            let result = sockopt.set_option(pid, fd, &option, value)?;
            result.print(&mut stdout, format, opts)?;
        }
        Command::List { pid, fd, all } => {
            opts.all = all;
            let listing = sockopt.list_options(pid, fd)?;
            if format == OutputFormat::Text && !all {
                for diagnostic in &listing.diagnostics {
                    eprintln!("Warning: {}", diagnostic);
                }
            }
            listing.print(&mut stdout, format, opts)?;
        }
        Command::Options => {
            Options(registry).print(&mut stdout, format, opts)?;
        }
        Command::Sockets { pid } => {
            let sockets = sox::procfs::tcp_sockets(pid).with_context(|| match pid {
                Some(pid) => format!("failed to read TCP sockets of process {}", pid),
                None => "failed to read TCP sockets".to_string(),
            })?;
            Sockets(sockets).print(&mut stdout, format, opts)?;
        }
    }

    Ok(())
}
