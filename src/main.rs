//! ppfmt - Rule-pipeline source formatter

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::HashMap;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use ppfmt::filter::ExcludePatternFilter;
use ppfmt::{
    build_cli, parse_args, CancellationToken, CliArgs, Config, LanguageRegistry, Pipeline,
    PipelineOutcome, ProjectContext, Workspace,
};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Language picked for stdin when `--stdin-filename` is absent
const DEFAULT_STDIN_NAME: &str = "stdin.c";

fn main() -> Result<()> {
    let args = parse_args();
    init_tracing(&args);

    // Check if we should read from stdin
    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    // If no inputs and running interactively, print usage; otherwise read from stdin
    if args.inputs.is_empty() && io::stdin().is_terminal() {
        build_cli().print_help()?;
        return Ok(());
    }

    let languages = Arc::new(LanguageRegistry::with_defaults());
    let runner = Runner::new(&args, Workspace::new(languages))?;

    if use_stdin {
        return process_stdin(&runner);
    }

    // Configure thread pool if --jobs specified
    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let files = collect_files(&args, &runner.workspace)?;
    if files.is_empty() {
        info!("no source files found to format");
        return Ok(());
    }

    let summary = Summary::default();
    let use_sequential = args.stdout || args.jobs == Some(1);
    if use_sequential {
        // Sequential processing keeps --stdout output in input order
        for path in &files {
            summary.record(path, runner.process_file(path));
        }
    } else {
        files
            .par_iter()
            .for_each(|path| summary.record(path, runner.process_file(path)));
    }

    summary.report(args.check);
    if summary.failed(args.check) {
        std::process::exit(1);
    }
    Ok(())
}

/// `-D` shows debug events, `-S` only errors; `RUST_LOG` wins when set
fn init_tracing(args: &CliArgs) {
    let default_level = if args.debug {
        "debug"
    } else if args.silent {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

/// Build configuration from CLI args and optional config file
///
/// If `for_path` is provided and no explicit config file is specified,
/// uses auto-discovery to find config files in parent directories.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().unwrap_or_default(),
        };
        let discovered = Config::discover_config_files(&start);
        if discovered.is_empty() {
            debug!("no config files discovered for {}", start.display());
        }
        for file in &discovered {
            debug!("discovered config file {}", file.display());
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    config
        .preprocessor_configurations
        .extend(args.preprocessor.iter().cloned());
    for pattern in &args.exclude {
        if !config.exclude.contains(pattern) {
            config.exclude.push(pattern.clone());
        }
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(dir) = &args.reserved_dir {
        config.reserved_directory.clone_from(dir);
    }
    if let Some(indent_size) = args.indent_size {
        config.style.indent_size = indent_size;
    }
    if let Some(val) = args.use_tabs {
        config.style.use_tabs = val;
    }
    if let Some(val) = args.space_after_comma {
        config.style.space_after_comma = val;
    }
    if let Some(val) = args.space_within_parentheses {
        config.style.space_within_parentheses = val;
    }
    if let Some(val) = args.max_blank_lines {
        config.style.max_blank_lines = val;
    }

    debug!("configuration: {config:?}");

    // Validate configuration
    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Pipeline and project settings derived from one resolved config
struct Setup {
    pipeline: Pipeline,
    project: Arc<ProjectContext>,
}

impl Setup {
    fn new(config: &Config, languages: &Arc<LanguageRegistry>, root: Option<&Path>) -> Result<Self> {
        let name = root
            .and_then(Path::file_name)
            .map_or_else(|| "ppfmt".to_string(), |n| n.to_string_lossy().into_owned());
        let mut project = ProjectContext::new(name, config.format_options());
        if let Some(root) = root {
            project = project.with_root(root);
        }
        Ok(Self {
            pipeline: Pipeline::standard(Arc::clone(languages), config)?,
            project: Arc::new(project),
        })
    }
}

struct Runner<'a> {
    args: &'a CliArgs,
    workspace: Workspace,
    /// Never cancelled by the CLI itself, which runs every file to completion.
    /// Embedders driving [`Pipeline`] directly cancel through their own token.
    cancel: CancellationToken,
    /// Set when `-c` names one config for every file
    explicit: Option<Arc<Setup>>,
    /// Discovered setups keyed by directory
    by_dir: Mutex<HashMap<PathBuf, Arc<Setup>>>,
}

impl<'a> Runner<'a> {
    fn new(args: &'a CliArgs, workspace: Workspace) -> Result<Self> {
        let explicit = if args.config.is_some() {
            let config = build_config(args, None)?;
            Some(Arc::new(Setup::new(&config, workspace.languages(), None)?))
        } else {
            None
        };
        Ok(Self {
            args,
            workspace,
            cancel: CancellationToken::new(),
            explicit,
            by_dir: Mutex::new(HashMap::new()),
        })
    }

    fn setup_for(&self, path: &Path) -> Result<Arc<Setup>> {
        if let Some(setup) = &self.explicit {
            return Ok(Arc::clone(setup));
        }
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut cache = self.by_dir.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(setup) = cache.get(&dir) {
            return Ok(Arc::clone(setup));
        }
        let config = build_config(self.args, Some(&dir))?;
        let setup = Arc::new(Setup::new(&config, self.workspace.languages(), Some(&dir))?);
        cache.insert(dir, Arc::clone(&setup));
        Ok(setup)
    }

    fn process_file(&self, path: &Path) -> Result<FileReport> {
        let setup = self.setup_for(path)?;
        let document = self
            .workspace
            .load(path, Arc::clone(&setup.project), &self.cancel)?;

        match setup.pipeline.run(document, &self.cancel)? {
            PipelineOutcome::Excluded(document) => {
                debug!("{}: skipped", path.display());
                if self.args.stdout {
                    io::stdout().lock().write_all(document.source().as_bytes())?;
                }
                Ok(FileReport::Excluded)
            }
            PipelineOutcome::Cancelled => Ok(FileReport::Cancelled),
            PipelineOutcome::Formatted(formatted) => {
                for diagnostic in &formatted.diagnostics {
                    warn!("{diagnostic}");
                }
                let changed = formatted.is_changed();
                if self.args.stdout {
                    io::stdout().lock().write_all(formatted.text().as_bytes())?;
                } else if self.args.check {
                    if changed {
                        info!("{}: would reformat", path.display());
                    }
                } else if self.workspace.write(&formatted.document)? {
                    info!("{}: formatted", path.display());
                }
                Ok(FileReport::Formatted {
                    changed,
                    diagnostics: formatted.diagnostics.len(),
                })
            }
        }
    }
}

enum FileReport {
    Formatted { changed: bool, diagnostics: usize },
    Excluded,
    Cancelled,
}

#[derive(Default)]
struct Summary {
    processed: AtomicUsize,
    changed: AtomicUsize,
    excluded: AtomicUsize,
    diagnostics: AtomicUsize,
    errors: AtomicUsize,
}

impl Summary {
    fn record(&self, path: &Path, result: Result<FileReport>) {
        match result {
            Ok(FileReport::Formatted {
                changed,
                diagnostics,
            }) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
                if changed {
                    self.changed.fetch_add(1, Ordering::Relaxed);
                }
                self.diagnostics.fetch_add(diagnostics, Ordering::Relaxed);
            }
            Ok(FileReport::Excluded) => {
                self.excluded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(FileReport::Cancelled) => {
                debug!("{}: cancelled", path.display());
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                error!("error formatting {}: {e:#}", path.display());
            }
        }
    }

    fn report(&self, check: bool) {
        let processed = self.processed.load(Ordering::Relaxed);
        let changed = self.changed.load(Ordering::Relaxed);
        let excluded = self.excluded.load(Ordering::Relaxed);
        let diagnostics = self.diagnostics.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let verb = if check { "would change" } else { "changed" };
        info!(
            "Processed {processed} files ({changed} {verb}, {excluded} excluded), {diagnostics} diagnostics, {errors} errors."
        );
    }

    /// Errors always fail the run; changes and diagnostics only under `--check`
    fn failed(&self, check: bool) -> bool {
        self.errors.load(Ordering::Relaxed) > 0
            || (check
                && (self.changed.load(Ordering::Relaxed) > 0
                    || self.diagnostics.load(Ordering::Relaxed) > 0))
    }
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs, workspace: &Workspace) -> Result<Vec<PathBuf>> {
    let exclude = ExcludePatternFilter::new(&args.exclude)?;
    let wanted = |path: &Path| workspace.is_source_file(path) && !exclude.is_excluded(path);

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_file() {
            // Explicit files only need to pass the exclusion check
            if !exclude.is_excluded(input) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            if args.recursive {
                // WalkDir reports symlink loops as errors; skip them.
                for entry in WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(256)
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                {
                    let path = entry.path();
                    if path.is_file() && wanted(path) {
                        files.push(path.to_path_buf());
                    }
                }
            } else if let Ok(entries) = std::fs::read_dir(input) {
                // Non-recursive: only direct children
                for entry in entries.filter_map(std::result::Result::ok) {
                    let path = entry.path();
                    if path.is_file() && wanted(&path) {
                        files.push(path);
                    }
                }
            }
        } else {
            warn!("{}: no such file or directory", input.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Process input from stdin, output to stdout
fn process_stdin(runner: &Runner<'_>) -> Result<()> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;

    let name = runner
        .args
        .stdin_filename
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STDIN_NAME));
    let setup = runner.setup_for(&name)?;
    let document =
        runner
            .workspace
            .load_str(name, source, Arc::clone(&setup.project), &runner.cancel)?;

    match setup.pipeline.run(document, &runner.cancel)? {
        PipelineOutcome::Excluded(document) => {
            io::stdout().write_all(document.source().as_bytes())?;
        }
        PipelineOutcome::Formatted(formatted) => {
            for diagnostic in &formatted.diagnostics {
                warn!("{diagnostic}");
            }
            io::stdout().write_all(formatted.text().as_bytes())?;
            if runner.args.check && (formatted.is_changed() || !formatted.diagnostics.is_empty()) {
                std::process::exit(1);
            }
        }
        PipelineOutcome::Cancelled => anyhow::bail!("formatting stdin was cancelled"),
    }
    Ok(())
}
