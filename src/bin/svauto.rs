//! svauto: expand verilog-mode AUTO markers in SystemVerilog files
//!
//! ## Example Usage
//!
//! ```bash
//! # Expand in place, searching rtl/lib for submodules
//! svauto -y rtl/lib rtl/top.sv
//!
//! # Preview as a unified diff
//! svauto --dry-run -f design.f +incdir+rtl/include
//!
//! # Remove every generated region
//! svauto --delete rtl/top.sv
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use svauto::auto::AutoExpander;
use svauto::hir::{Compilation, DiagnosticCollector};
use svauto::ide::unified_diff;
use svauto::project::file_loader::{expand_paths, write_file};
use svauto::project::{
    CliFlag, CliOverrides, ConfigStack, FileList, Grouping, MergedConfig, WorkspaceLoader,
};

#[derive(Parser, Debug)]
#[command(
    name = "svauto",
    author,
    version,
    about = "Expand verilog-mode AUTO markers in SystemVerilog",
    long_about = "Expands /*AUTOINST*/, /*AUTOLOGIC*/ and /*AUTOPORTS*/ markers in place.\n\n\
                  Positional arguments may mix source files, directories and \
                  simulator-style +incdir+ / +libext+ options."
)]
struct Args {
    /// Source files, directories, or +incdir+/+libext+ options
    paths: Vec<String>,

    /// Read additional arguments from a file list
    #[arg(short = 'f', long = "file-list", value_name = "FILE")]
    file_lists: Vec<PathBuf>,

    /// Library directory searched for <module><ext>
    #[arg(short = 'y', long = "library-dir", value_name = "DIR")]
    library_dirs: Vec<PathBuf>,

    /// Include directory
    #[arg(short = 'I', long = "incdir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Library extension, e.g. .sv
    #[arg(long = "libext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Library file loaded when a module is not found elsewhere
    #[arg(long = "library-file", value_name = "FILE")]
    library_files: Vec<PathBuf>,

    /// Treat unresolved modules and ports as errors
    #[arg(long)]
    strict: bool,

    /// Print a unified diff instead of writing files
    #[arg(long, visible_alias = "diff")]
    dry_run: bool,

    /// Remove generated regions instead of expanding
    #[arg(long)]
    delete: bool,

    /// Indent unit: a number of spaces or literal text
    #[arg(long, value_name = "INDENT")]
    indent: Option<String>,

    /// Column-align generated connections
    #[arg(long)]
    align: bool,

    /// Connection order: by-direction or alphabetical
    #[arg(long, default_value = "by-direction")]
    grouping: Grouping,

    /// Load every input into one compilation before expanding
    #[arg(long)]
    single_unit: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn indent_text(value: &str) -> String {
    match value.parse::<usize>() {
        Ok(width) => " ".repeat(width),
        Err(_) => value.to_string(),
    }
}

/// Fold flags and file lists into the CLI layer. Only flags that came
/// from the command line are marked explicit.
fn cli_overrides(args: &Args, matches: &ArgMatches, list: &FileList) -> CliOverrides {
    let mut cli = CliOverrides::new();
    cli.indent = args.indent.as_deref().map(indent_text);
    cli.align = args.align;
    cli.grouping = args.grouping;
    cli.strict = args.strict;
    cli.verbosity = args.verbose;
    cli.single_unit = args.single_unit;

    cli.library_dirs = args.library_dirs.clone();
    cli.library_dirs.extend(list.library_dirs.iter().cloned());
    cli.include_dirs = args.include_dirs.clone();
    cli.include_dirs.extend(list.include_dirs.iter().cloned());
    cli.extensions = args.extensions.clone();
    cli.extensions.extend(list.extensions.iter().cloned());
    cli.library_files = args.library_files.clone();
    cli.library_files.extend(list.library_files.iter().cloned());

    for (id, flag) in [
        ("indent", CliFlag::Indent),
        ("align", CliFlag::Align),
        ("grouping", CliFlag::Grouping),
        ("strict", CliFlag::Strict),
        ("verbose", CliFlag::Verbosity),
        ("single_unit", CliFlag::SingleUnit),
    ] {
        if matches.value_source(id) == Some(ValueSource::CommandLine) {
            cli.mark_explicit(flag);
        }
    }
    cli
}

fn file_list(args: &Args) -> Result<FileList> {
    let mut list = FileList::new();
    let tokens: Vec<&str> = args.paths.iter().map(String::as_str).collect();
    let nested = list
        .apply_flags(&tokens, Path::new(""))
        .map_err(anyhow::Error::msg)?;
    for path in args.file_lists.iter().chain(&nested) {
        let loaded = FileList::load(path)?;
        list.sources.extend(loaded.sources);
        list.library_dirs.extend(loaded.library_dirs);
        list.include_dirs.extend(loaded.include_dirs);
        list.extensions.extend(loaded.extensions);
        list.library_files.extend(loaded.library_files);
    }
    Ok(list)
}

/// Counts for the closing summary line.
#[derive(Debug, Default)]
struct RunSummary {
    changed: usize,
    failed: usize,
}

struct Runner {
    stack: ConfigStack,
    base: MergedConfig,
    dry_run: bool,
    delete: bool,
    /// Every input of the run, kept at its latest text.
    design: Compilation,
    diagnostics: DiagnosticCollector,
    summary: RunSummary,
}

impl Runner {
    fn new(stack: ConfigStack, dry_run: bool, delete: bool) -> Self {
        let base = stack.base();
        Self {
            design: Compilation::new(base.search_paths()),
            stack,
            base,
            dry_run,
            delete,
            diagnostics: DiagnosticCollector::new(),
            summary: RunSummary::default(),
        }
    }

    /// Load all inputs for module lookup, then expand them one at a time.
    ///
    /// In single-unit mode inline library settings accumulate across files;
    /// otherwise each file expands against its own copy of the design.
    fn run(&mut self, sources: &[PathBuf]) {
        let failures = WorkspaceLoader::new().load_files_into_compilation(sources, &mut self.design);
        for (path, err) in &failures {
            tracing::error!(path = %path.display(), "{}", err);
        }
        self.summary.failed += failures.len();
        self.diagnostics.extend(self.design.take_diagnostics());

        for path in sources {
            if failures.iter().any(|(failed, _)| failed == path) {
                continue;
            }
            let updated = if self.base.single_unit {
                let mut design = std::mem::take(&mut self.design);
                let updated = self.process(&mut design, path);
                self.design = design;
                updated
            } else {
                let mut design = self.design.clone();
                self.process(&mut design, path)
            };
            if let Some(text) = updated {
                // Later files see the regenerated ports.
                self.design.add_source(path, text);
                self.design.take_diagnostics();
            }
        }
    }

    /// Expand or delete one file. Returns the new text when it changed.
    fn process(&mut self, compilation: &mut Compilation, path: &Path) -> Option<String> {
        let text = compilation.file(path).map(|f| f.text.clone())?;
        let config = match self.stack.for_file(path, &text) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %path.display(), "{}", err);
                self.summary.failed += 1;
                return None;
            }
        };

        if !self.delete {
            compilation.extend_search_paths(&config.search_paths());
            let names = compilation.instantiated_in(path);
            compilation.ensure_modules(names.iter().map(|n| n.as_str()));
        }
        self.diagnostics.extend(compilation.take_diagnostics());

        let file = compilation.file(path)?;
        let mut expander = AutoExpander::new(&*compilation, &config);
        let result = if self.delete {
            expander.delete(&file.text, &file.syntax)
        } else {
            expander.expand_file(file)
        };
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(path = %path.display(), "{}", err);
                self.summary.failed += 1;
                return None;
            }
        };
        self.diagnostics.extend(result.diagnostics);

        if result.replacements.is_empty() {
            info!(path = %path.display(), "up to date");
            return None;
        }
        info!(
            path = %path.display(),
            instances = result.stats.instances_expanded,
            logic = result.stats.logic_blocks,
            ports = result.stats.port_lists,
            "updated"
        );
        self.summary.changed += 1;

        if self.dry_run {
            print!("{}", unified_diff(&path.display().to_string(), &text, &result.text));
        } else if let Err(err) = write_file(path, &result.text) {
            tracing::error!(path = %path.display(), "{}", err);
            self.summary.failed += 1;
        }
        Some(result.text)
    }
}

fn main() -> Result<ExitCode> {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches)?;
    init_tracing(args.verbose);

    let list = file_list(&args)?;
    let cli = cli_overrides(&args, &matches, &list);
    let sources = expand_paths(&list.sources).context("collecting input files")?;
    if sources.is_empty() {
        bail!("no input files");
    }

    let mut runner = Runner::new(ConfigStack::new(cli.to_layer()), args.dry_run, args.delete);
    info!(files = sources.len(), single_unit = runner.base.single_unit, "starting");
    runner.run(&sources);

    let RunSummary { changed, failed } = runner.summary;
    eprintln!(
        "{} file(s) {}, {} failed, {} error(s), {} warning(s)",
        changed,
        if args.dry_run { "would change" } else { "changed" },
        failed,
        runner.diagnostics.error_count(),
        runner.diagnostics.warning_count()
    );

    if runner.diagnostics.has_errors() || failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
