//! Output formatting for sox command.

use std::io::{self, Write};

use serde_json::json;
use sox::{OptionListing, OptionRegistry, OptionResult, SocketOptionSpec, TcpSocketEntry};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// YAML output.
    Yaml,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Pretty print (for JSON; YAML is always block style).
    pub pretty: bool,
    /// Include failed rows in listings.
    pub all: bool,
}

/// Trait for types that can be printed.
pub trait Printable {
    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()>;

    /// Convert to JSON value.
    fn to_json(&self, opts: &OutputOptions) -> serde_json::Value;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, opts),
            OutputFormat::Json => {
                let json = self.to_json(opts);
                if opts.pretty {
                    serde_json::to_writer_pretty(&mut *w, &json)?;
                } else {
                    serde_json::to_writer(&mut *w, &json)?;
                }
                writeln!(w)?;
                Ok(())
            }
            OutputFormat::Yaml => {
                serde_yaml::to_writer(&mut *w, &self.to_json(opts)).map_err(io::Error::other)
            }
        }
    }
}

/// Column-aligned text table; the last column is not padded.
struct Table {
    header: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: Vec<&'static str>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header: Vec<String> = self.header.iter().map(|h| h.to_string()).collect();
        for row in std::iter::once(&header).chain(&self.rows) {
            let last = row.len().saturating_sub(1);
            for (i, cell) in row.iter().enumerate() {
                if i == last {
                    write!(w, "{}", cell)?;
                } else {
                    write!(w, "{:<width$}  ", cell, width = widths[i])?;
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

fn value_cell(result: &OptionResult) -> String {
    match result.value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

fn option_table<'a>(results: impl IntoIterator<Item = &'a OptionResult>) -> Table {
    let mut table = Table::new(vec!["OPTION", "VALUE", "DESCRIPTION"]);
    for result in results {
        let description = match &result.error {
            Some(error) => format!("({})", error),
            None => result.description.to_string(),
        };
        table.push(vec![result.name.to_string(), value_cell(result), description]);
    }
    table
}

impl Printable for OptionResult {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> io::Result<()> {
        option_table([self]).write(w)
    }

    fn to_json(&self, _opts: &OutputOptions) -> serde_json::Value {
        json!({
            "name": self.name,
            "value": self.value,
            "description": self.description,
        })
    }
}

impl Printable for OptionListing {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()> {
        if opts.all {
            option_table(&self.rows()).write(w)
        } else {
            option_table(&self.results).write(w)
        }
    }

    fn to_json(&self, opts: &OutputOptions) -> serde_json::Value {
        let results: Vec<_> = if opts.all {
            self.rows().iter().map(result_json).collect()
        } else {
            self.results.iter().map(result_json).collect()
        };
        let diagnostics: Vec<_> = self
            .diagnostics
            .iter()
            .map(|d| {
                json!({
                    "name": d.name(),
                    "errno": d.error.errno(),
                    "error": d.error.to_string(),
                })
            })
            .collect();

        json!({
            "results": results,
            "diagnostics": diagnostics,
        })
    }
}

fn result_json(result: &OptionResult) -> serde_json::Value {
    let mut json = json!({
        "name": result.name,
        "value": result.value,
        "description": result.description,
    });
    if let Some(ref error) = result.error {
        json["error"] = json!(error);
    }
    json
}

/// The option registry, for `sox options`.
pub struct Options<'a>(pub &'a OptionRegistry);

fn range_cell(spec: &SocketOptionSpec) -> String {
    match spec.max_value {
        Some(max) => format!("{}..{}", spec.min_value, max),
        None => format!("{}..", spec.min_value),
    }
}

impl Printable for Options<'_> {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> io::Result<()> {
        let mut table = Table::new(vec!["OPTION", "LEVEL", "CODE", "RANGE", "DESCRIPTION"]);
        for spec in self.0.iter() {
            table.push(vec![
                spec.name.to_string(),
                spec.level.name().to_string(),
                spec.code.to_string(),
                range_cell(spec),
                spec.description.to_string(),
            ]);
        }
        table.write(w)
    }

    fn to_json(&self, _opts: &OutputOptions) -> serde_json::Value {
        let specs: Vec<_> = self
            .0
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "level": spec.level.name(),
                    "code": spec.code,
                    "min": spec.min_value,
                    "max": spec.max_value,
                    "unsigned": spec.unsigned,
                    "description": spec.description,
                })
            })
            .collect();
        json!(specs)
    }
}

/// Discovered TCP sockets, for `sox sockets`.
pub struct Sockets(pub Vec<TcpSocketEntry>);

impl Printable for Sockets {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> io::Result<()> {
        let mut table = Table::new(vec!["STATE", "LOCAL", "REMOTE", "PID", "FD", "INODE"]);
        for entry in &self.0 {
            let (pid, fd) = match entry.owner {
                Some(owner) => (owner.pid.to_string(), owner.fd.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            table.push(vec![
                entry.state.name().to_string(),
                entry.local.to_string(),
                entry.remote.to_string(),
                pid,
                fd,
                entry.inode.to_string(),
            ]);
        }
        table.write(w)
    }

    fn to_json(&self, _opts: &OutputOptions) -> serde_json::Value {
        let sockets: Vec<_> = self
            .0
            .iter()
            .map(|entry| {
                json!({
                    "state": entry.state.name(),
                    "local": {
                        "address": entry.local.ip().to_string(),
                        "port": entry.local.port(),
                    },
                    "remote": {
                        "address": entry.remote.ip().to_string(),
                        "port": entry.remote.port(),
                    },
                    "uid": entry.uid,
                    "inode": entry.inode,
                    "pid": entry.owner.map(|o| o.pid),
                    "fd": entry.owner.map(|o| o.fd),
                })
            })
            .collect();
        json!(sockets)
    }
}
