use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Receiver;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use netsniff_core::{CaptureSummary, ChannelSink, SniffEvent, SniffOptions, sniff_pcap_file};
use serde::Serialize;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("NETSNIFF_BUILD_COMMIT"),
    ", ",
    env!("NETSNIFF_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "netsniff")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Passive sniffer: classifies captured traffic (TLS SNI, NTLM, HTTP, DNS, mDNS, Kerberos, UPnP, 802.11).",
    long_about = None,
    after_help = "Examples:\n  netsniff pcap sniff capture.pcapng --stdout\n  netsniff pcap sniff capture.pcap -o events.jsonl --verbose\n  netsniff pcap sniff 'captures/*.pcapng' --stdout --format text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Replay a capture file and write one event per classified frame.
    Sniff(SniffArgs),
}

#[derive(clap::Args, Debug)]
struct SniffArgs {
    /// Path (or glob matching one file) to a .pcap or .pcapng file
    input: PathBuf,

    /// Output path for the event stream
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    output: Option<PathBuf>,

    /// Write events to stdout
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Also report traffic no protocol decoder recognises
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Event line format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Capacity of the event queue between capture and writer
    #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u32).range(1..))]
    queue: u32,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Print a JSON run summary to stderr
    #[arg(long)]
    summary: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Timestamp followed by the rendered message
    Text,
}

/// Run summary printed with `--summary`.
#[derive(Debug, Serialize)]
struct RunSummary {
    #[serde(flatten)]
    capture: CaptureSummary,
    events_written: u64,
    events_dropped: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Sniff(args) => {
                init_logging(args.debug);
                cmd_pcap_sniff(args)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // A logger may already be installed when embedded.
    let _ = builder.try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_sniff(args: SniffArgs) -> Result<(), CliError> {
    let input = resolve_input_path(&args.input)?;
    validate_input_file(&input)?;

    let output = if args.stdout {
        None
    } else {
        let path = args.output.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&input, &path)?;
        Some(path)
    };

    let writer = open_writer(output.as_deref())?;
    // File replay can wait on the writer, so nothing is dropped for lack of room.
    let (sink, events) = ChannelSink::blocking(args.queue as usize);
    let format = args.format;
    let consumer = thread::Builder::new()
        .name("event-writer".to_string())
        .spawn(move || write_events(events, writer, format))
        .context("Failed to start event writer")?;

    let options = SniffOptions {
        verbose: args.verbose,
        ..SniffOptions::default()
    };
    let capture = sniff_pcap_file(&input, &sink, &options);
    let events_dropped = sink.dropped();
    // Closing the sink ends the writer loop.
    drop(sink);

    let written = consumer
        .join()
        .map_err(|_| CliError::new("event writer panicked", None))?;
    let capture = capture
        .with_context(|| format!("Failed to sniff capture: {}", input.display()))?;
    let events_written = written.context("Failed to write events")?;

    log::debug!(
        "{}: {} events written, {} dropped",
        capture.source,
        events_written,
        events_dropped
    );

    if events_dropped > 0 && !args.quiet {
        eprintln!("warning: {events_dropped} events dropped (event writer stopped)");
    }
    if args.summary {
        let summary = RunSummary {
            capture,
            events_written,
            events_dropped,
        };
        let json = serde_json::to_string(&summary).context("JSON serialization failed")?;
        eprintln!("{json}");
    }
    if let Some(path) = output.as_ref() {
        if !args.quiet {
            eprintln!("OK: {} events written -> {}", events_written, path.display());
        }
    }
    Ok(())
}

fn open_writer(output: Option<&Path>) -> Result<Box<dyn Write + Send>, CliError> {
    let Some(path) = output else {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn write_events(
    events: Receiver<SniffEvent>,
    mut writer: Box<dyn Write + Send>,
    format: OutputFormat,
) -> Result<u64> {
    let mut written = 0u64;
    for event in events {
        write_event(&mut writer, &event, format)?;
        written += 1;
    }
    writer.flush().context("Failed to flush event output")?;
    Ok(written)
}

fn write_event(writer: &mut dyn Write, event: &SniffEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, event).context("JSON serialization failed")?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            let time = event.time_rfc3339().unwrap_or_else(|| "-".to_string());
            writeln!(writer, "{} {}", time, event.render_message())?;
        }
    }
    Ok(())
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // The directory may not exist yet; it cannot contain the input then.
    let Ok(output_dir) = fs::canonicalize(output_dir) else {
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| CliError::new(format!("invalid output path: {}", output.display()), None))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({count} matches); matches: {listed}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_detection() {
        assert!(is_glob_pattern("captures/*.pcap"));
        assert!(is_glob_pattern("capture-?.pcapng"));
        assert!(!is_glob_pattern("capture.pcapng"));
    }

    #[test]
    fn text_lines_render_time_and_message() {
        let event = SniffEvent::new(Some(1.0), "dns", "10.0.0.1:5000", "10.0.0.53:53")
            .with_message("{} {} asks for {}", ["dns", "10.0.0.1", "example.com"]);
        let mut out = Vec::new();
        write_event(&mut out, &event, OutputFormat::Text).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1970-01-01T00:00:01Z dns 10.0.0.1 asks for example.com\n"
        );
    }

    #[test]
    fn json_lines_are_newline_terminated() {
        let event = SniffEvent::new(None, "udp", "a", "b").with_data("Size", 3);
        let mut out = Vec::new();
        write_event(&mut out, &event, OutputFormat::Json).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["protocol"], "udp");
        assert_eq!(value["data"]["Size"], 3);
    }
}
