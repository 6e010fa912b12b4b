//! imgaudit CLI - find image assets a build never uses.
//!
//! Features:
//! - One-shot static reports for CI (`--fail-on-unused`)
//! - Watch mode with a live, auto-refreshing report server
//! - Referenced paths from a build manifest and/or explicit `--reference` flags
//! - Optional `imgaudit.toml` in the project root; flags override it

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use imgaudit_core::{
    init_structured_logging, load_config, load_manifest, log_config_ignored, log_cycle_failed,
    log_report_written, print_json, print_plain, AuditConfig, ImgAudit, LiveServer, Mode,
    RenderedReport,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Report which image assets a build actually uses")]
pub struct Cli {
    /// Path to the project root
    #[arg(default_value = ".")]
    path: String,

    /// Build manifest (JSON) listing the modules and assets of the build
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Image path that counts as used (absolute or relative to the project root)
    #[arg(long = "reference", value_name = "PATH")]
    references: Vec<PathBuf>,

    /// Image extension to recognize (repeatable, e.g. --ext png --ext svg)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Directory name that is never scanned (repeatable)
    #[arg(long = "ignore-dir", value_name = "NAME")]
    ignore_dirs: Vec<String>,

    /// Report mode: static (one report) or watch (live server)
    #[arg(long)]
    mode: Option<Mode>,

    /// Directory the report files are written to
    #[arg(long, default_value = "dist")]
    out_dir: PathBuf,

    /// File name of the HTML report
    #[arg(long, value_name = "NAME")]
    html_file: Option<String>,

    /// File name of the JSON report
    #[arg(long, value_name = "NAME")]
    json_file: Option<String>,

    /// Also write the JSON report
    #[arg(long)]
    json: bool,

    /// Live server port (watch mode)
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between report cycles (watch mode)
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Print the report as JSON instead of the plain summary
    #[arg(long)]
    print_json: bool,

    /// Exit with code 1 when unused images exist (static mode)
    #[arg(long)]
    fail_on_unused: bool,
}

/// Validates an output file name for security.
///
/// Rejects:
/// - Null bytes
/// - Absolute paths
/// - Path traversal (`..`)
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Err(anyhow!(
            "Output path must be relative, not absolute: {}",
            path
        ));
    }

    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(anyhow!(
                "Path traversal (..) not allowed in output paths: {}",
                path
            ));
        }
    }

    Ok(p)
}

/// Config file values with command-line overrides applied.
fn resolve_config(cli: &Cli, root: &Path) -> Result<AuditConfig> {
    let mut config = match load_config(root) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            log_config_ignored(root, &e);
            AuditConfig::default()
        }
    };

    if !cli.extensions.is_empty() {
        config.allowed_extensions = cli.extensions.clone();
    }
    if !cli.ignore_dirs.is_empty() {
        config.ignore_dirs = cli.ignore_dirs.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(name) = &cli.html_file {
        config.html_report = name.clone();
    }
    if let Some(name) = &cli.json_file {
        config.json_report = name.clone();
    }
    if cli.json {
        config.emit_json = true;
    }
    if let Some(port) = cli.port {
        config.serve.port = port;
    }
    if let Some(secs) = cli.interval {
        config.watch_interval_secs = secs;
    }

    config.normalize();
    config.validate(root)?;
    validate_output_path(&config.html_report)?;
    if config.emit_json {
        validate_output_path(&config.json_report)?;
    }
    Ok(config)
}

/// Output directory; relative paths are taken from the project root.
fn resolve_out_dir(out_dir: &Path, root: &Path) -> PathBuf {
    if out_dir.is_absolute() {
        out_dir.to_path_buf()
    } else {
        root.join(out_dir)
    }
}

/// Builder for one cycle. The manifest is re-read on every call.
fn build_audit(cli: &Cli, root: &Path, config: &AuditConfig) -> Result<ImgAudit> {
    let mut audit = ImgAudit::new(root)
        .with_config(config.clone())
        .references(cli.references.iter().cloned());

    if let Some(path) = &cli.manifest {
        let manifest = load_manifest(path)
            .with_context(|| format!("Failed to load build manifest {}", path.display()))?;
        audit = audit.manifest(manifest);
    }
    Ok(audit)
}

/// Write the rendered documents into `out_dir`, returning the written paths.
fn write_outputs(
    out_dir: &Path,
    config: &AuditConfig,
    rendered: &RenderedReport,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(2);

    let html_path = out_dir.join(validate_output_path(&config.html_report)?);
    fs::write(&html_path, &rendered.html)
        .with_context(|| format!("Failed to write HTML report: {}", html_path.display()))?;
    log_report_written(&html_path, rendered.html.len());
    written.push(html_path);

    if let Some(json) = &rendered.json {
        let json_path = out_dir.join(validate_output_path(&config.json_report)?);
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write JSON report: {}", json_path.display()))?;
        log_report_written(&json_path, json.len());
        written.push(json_path);
    }

    Ok(written)
}

/// Single report cycle. Returns the process exit code.
fn run_static(cli: &Cli, root: &Path, config: &AuditConfig) -> Result<i32> {
    let audit = build_audit(cli, root, config)?;
    let model = audit.generate()?;
    let rendered = audit.render_and_publish(&model, None)?;

    write_outputs(&resolve_out_dir(&cli.out_dir, root), config, &rendered)?;

    if cli.print_json {
        print_json(&model);
    } else {
        print_plain(&model);
    }

    Ok(if cli.fail_on_unused && model.has_unused() { 1 } else { 0 })
}

/// One watch-mode cycle: regenerate, publish, persist.
fn watch_cycle(cli: &Cli, root: &Path, config: &AuditConfig, server: &LiveServer) -> Result<()> {
    let audit = build_audit(cli, root, config)?;
    let model = audit.generate()?;
    let rendered = audit.render_and_publish(&model, Some(server))?;
    write_outputs(&resolve_out_dir(&cli.out_dir, root), config, &rendered)?;
    Ok(())
}

/// Serve the live report until Ctrl+C.
fn run_watch(cli: &Cli, root: &Path, config: &AuditConfig) -> Result<i32> {
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Failed to install Ctrl+C handler")?;
    }

    let server = LiveServer::new(&config.serve);
    let addr = server.start()?;
    println!("Image asset report: http://{}", addr);

    let interval = Duration::from_secs(config.watch_interval_secs);
    while running.load(Ordering::SeqCst) {
        if let Err(e) = watch_cycle(cli, root, config, &server) {
            log_cycle_failed(&e);
        }

        let next = Instant::now() + interval;
        while running.load(Ordering::SeqCst) && Instant::now() < next {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    server.shutdown();
    Ok(0)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] imgaudit internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    // JSON logs to stderr, respects RUST_LOG
    init_structured_logging();

    let cli = Cli::parse();
    let root = PathBuf::from(&cli.path);
    if !root.is_dir() {
        return Err(anyhow!("Project root is not a directory: {}", cli.path));
    }

    let config = resolve_config(&cli, &root)?;

    let code = match config.mode {
        Mode::Static => run_static(&cli, &root, &config)?,
        Mode::Watch => run_watch(&cli, &root, &config)?,
    };
    std::process::exit(code);
}
