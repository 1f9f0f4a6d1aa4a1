use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use outprinter_printing::completion::{font_names, paper_size_names, printer_names};
use outprinter_printing::input::classify_piped;
use outprinter_printing::{
    run_print, CancelToken, InputFormat, LpPrintSystem, MarginRequest, PageSettingsRequest,
    PipedInput, PrintInput, PrintJobError, PrintRequest, PrintSystem, PrinterCapabilities,
    ScaleMode, VIRTUAL_PDF_PRINTER,
};
use outprinter_settings::{resolve_config_path, Preferences, PreferencesStore};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod interrupt;

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(
    name = "outprinter",
    about = "Print text, piped objects or images to a printer or a PDF file",
    author,
    version
)]
struct Cli {
    /// Preferences file (defaults to $XDG_CONFIG_HOME/outprinter/preferences.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// More log output; repeat for trace level.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print stdin, a text file or an image.
    #[command(visible_alias = "lp")]
    Print(PrintArgs),
    /// Show the system default printer.
    GetDefault,
    /// Change the system default printer.
    SetDefault(SetDefaultArgs),
    /// List valid values for shell completion.
    Complete(CompleteArgs),
    /// Import or export preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct PrintArgs {
    /// Text file to print instead of stdin.
    #[arg(long, visible_alias = "file-name", value_name = "FILE", conflicts_with = "image_path")]
    path: Option<PathBuf>,
    /// Image file (BMP, GIF, JPEG, PNG or TIFF) to print.
    #[arg(long, value_name = "FILE")]
    image_path: Option<PathBuf>,
    /// How to read stdin.
    #[arg(long, value_enum, default_value_t = InputFormatChoice::Auto)]
    input_format: InputFormatChoice,
    /// Printer to use; defaults to the system default printer.
    #[arg(short = 'p', long, visible_alias = "name", value_name = "NAME")]
    printer: Option<String>,
    /// Paper size name, e.g. Letter or A4.
    #[arg(long, value_name = "NAME")]
    paper_size: Option<String>,
    /// Font family for text.
    #[arg(long, value_name = "NAME")]
    font: Option<String>,
    /// Font size in points.
    #[arg(long, value_name = "POINTS")]
    font_size: Option<f32>,
    /// Write the job to this PDF file instead of a printer.
    #[arg(long, visible_alias = "print-file-name", value_name = "FILE")]
    destination: Option<PathBuf>,
    /// Open the destination file once printed.
    #[arg(long, visible_alias = "show", requires = "destination")]
    open: bool,
    #[arg(long)]
    landscape: bool,
    /// Print portrait even when landscape is saved in the preferences.
    #[arg(long, conflicts_with = "landscape")]
    portrait: bool,
    /// Margins in hundredths of an inch; -1 keeps the default.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, value_name = "N")]
    top_margin: i32,
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, value_name = "N")]
    bottom_margin: i32,
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, value_name = "N")]
    left_margin: i32,
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, value_name = "N")]
    right_margin: i32,
    /// Print images at their native size.
    #[arg(long)]
    no_image_scale: bool,
    /// Do not wrap long lines.
    #[arg(long, visible_alias = "no-wrap-text")]
    no_text_wrap: bool,
    /// Wrap long lines even when wrapping is turned off in the preferences.
    #[arg(long, conflicts_with = "no_text_wrap")]
    wrap_text: bool,
    /// Header template; supports &[Page], &[Date], &[Time], &[Path], &[Line], &[HistoryId].
    #[arg(long, value_name = "TEMPLATE")]
    header: Option<String>,
    /// Footer template.
    #[arg(long, value_name = "TEMPLATE")]
    footer: Option<String>,
    /// Number pages in the footer.
    #[arg(long)]
    page_numbers: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormatChoice {
    Auto,
    Text,
    Json,
}

impl From<InputFormatChoice> for InputFormat {
    fn from(choice: InputFormatChoice) -> Self {
        match choice {
            InputFormatChoice::Auto => InputFormat::Auto,
            InputFormatChoice::Text => InputFormat::Text,
            InputFormatChoice::Json => InputFormat::Json,
        }
    }
}

#[derive(Args)]
struct SetDefaultArgs {
    /// Printer to make the default.
    #[arg(value_name = "NAME")]
    name: String,
    /// Print the resulting default printer.
    #[arg(long)]
    passthru: bool,
}

#[derive(Args)]
struct CompleteArgs {
    #[arg(value_enum)]
    kind: CompletionKind,
    /// Only values containing this text.
    #[arg(value_name = "WORD", default_value = "")]
    word: String,
    /// Printer whose paper sizes are listed.
    #[arg(long, value_name = "NAME")]
    printer: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionKind {
    Printers,
    PaperSizes,
    Fonts,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// Export current preferences.
    Export(PreferencesExportArgs),
    /// Import preferences from JSON.
    Import(PreferencesImportArgs),
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(exit_code(&err));
    }
}

/// 130 for an interrupted job anywhere in the error chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    let cancelled = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<PrintJobError>(),
            Some(PrintJobError::Cancelled { .. })
        )
    });
    if cancelled {
        INTERRUPTED_EXIT_CODE
    } else {
        1
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config, command, ..
    } = cli;
    let system = LpPrintSystem::new();
    match command {
        Commands::Print(args) => {
            let preferences = load_preferences(config.as_deref())?;
            execute_print(&system, args, &preferences)
        }
        Commands::GetDefault => execute_get_default(&system),
        Commands::SetDefault(args) => execute_set_default(&system, args),
        Commands::Complete(args) => execute_complete(&system, args),
        Commands::Preferences(subcommand) => {
            let prefs_path = preferences_path(config.as_deref())?;
            execute_preferences_command(subcommand, &prefs_path)
        }
    }
}

fn preferences_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_config_path(explicit).ok_or_else(|| {
        anyhow!("cannot locate the preferences file; set HOME or pass --config")
    })
}

fn load_preferences(explicit: Option<&Path>) -> Result<Preferences> {
    let Some(path) = resolve_config_path(explicit) else {
        return Ok(Preferences::default());
    };
    let store = PreferencesStore::load(&path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))?;
    debug!(path = %path.display(), "loaded preferences");
    Ok(store.preferences().clone())
}

fn execute_print(system: &LpPrintSystem, args: PrintArgs, preferences: &Preferences) -> Result<()> {
    let input = read_input(&args)?;
    let request = build_request(args.clone_settings(), input, preferences);
    let cancel = CancelToken::new();
    interrupt::cancel_on_ctrl_c(&cancel);

    let outcome = run_print(system, &request, &cancel).map_err(|err| match err {
        PrintJobError::PrinterNotFound { .. } => {
            let valid = system
                .installed_printers()
                .map(|names| names.join(", "))
                .unwrap_or_default();
            anyhow!("{err}. Valid printers: {valid}")
        }
        other => anyhow::Error::new(other),
    })?;

    let Some(summary) = outcome.summary else {
        return Ok(());
    };
    info!(pages = summary.pages, "printed to {}", outcome.target);
    if args.open {
        if let Some(path) = outcome.target.destination() {
            open_in_viewer(path);
        }
    }
    Ok(())
}

fn read_input(args: &PrintArgs) -> Result<PrintInput> {
    if let Some(path) = &args.image_path {
        return Ok(PrintInput::ImageFile(path.clone()));
    }
    if let Some(path) = &args.path {
        return Ok(PrintInput::TextFile(path.clone()));
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("nothing to print: pipe text into outprinter or pass --path / --image-path");
    }
    let mut bytes = Vec::new();
    stdin
        .read_to_end(&mut bytes)
        .context("failed to read standard input")?;
    let piped = classify_piped(bytes, args.input_format.into())
        .context("standard input is not valid JSON")?;
    Ok(match piped {
        PipedInput::Text(text) => PrintInput::Text(text),
        PipedInput::Values(values) => PrintInput::Values(values),
        PipedInput::Image(bytes) => PrintInput::ImageBytes(bytes),
    })
}

/// The print settings of [`PrintArgs`], without the input selection.
struct PrintSettings {
    printer: Option<String>,
    paper_size: Option<String>,
    font: Option<String>,
    font_size: Option<f32>,
    destination: Option<PathBuf>,
    /// `None` when neither `--landscape` nor `--portrait` was given.
    landscape: Option<bool>,
    margins: [i32; 4],
    no_image_scale: bool,
    wrap: Option<bool>,
    header: Option<String>,
    footer: Option<String>,
    page_numbers: bool,
}

impl PrintArgs {
    fn clone_settings(&self) -> PrintSettings {
        PrintSettings {
            printer: self.printer.clone(),
            paper_size: self.paper_size.clone(),
            font: self.font.clone(),
            font_size: self.font_size,
            destination: self.destination.clone(),
            landscape: explicit_flag(self.landscape, self.portrait),
            margins: [
                self.top_margin,
                self.bottom_margin,
                self.left_margin,
                self.right_margin,
            ],
            no_image_scale: self.no_image_scale,
            wrap: explicit_flag(self.wrap_text, self.no_text_wrap),
            header: self.header.clone(),
            footer: self.footer.clone(),
            page_numbers: self.page_numbers,
        }
    }
}

/// `Some(true)` for the `on` flag, `Some(false)` for its negation, else `None`.
fn explicit_flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Command-line values win over preferences, which win over built-in defaults.
fn build_request(settings: PrintSettings, input: PrintInput, preferences: &Preferences) -> PrintRequest {
    let saved = &preferences.printer.margins;
    let [top, bottom, left, right] = settings.margins;
    let cli_margins = MarginRequest::from_sentinels(top, bottom, left, right);
    let margins = MarginRequest {
        top: cli_margins.top.or(saved.top),
        bottom: cli_margins.bottom.or(saved.bottom),
        left: cli_margins.left.or(saved.left),
        right: cli_margins.right.or(saved.right),
    };

    let mut request = PrintRequest::new(input);
    request.printer = settings.printer.or_else(|| preferences.printer.name.clone());
    request.destination = settings.destination;
    request.page = PageSettingsRequest {
        paper_size: settings
            .paper_size
            .or_else(|| preferences.printer.paper_size.clone()),
        margins,
        landscape: settings.landscape.unwrap_or(preferences.printer.landscape),
    };
    request.font_family = settings
        .font
        .unwrap_or_else(|| preferences.text.font.clone());
    request.font_size = settings.font_size.unwrap_or(preferences.text.font_size);
    request.wrap = settings.wrap.unwrap_or(preferences.text.wrap);
    request.scale = ScaleMode::from_no_scale(settings.no_image_scale);
    request.header = settings.header.or_else(|| preferences.text.header.clone());
    request.footer = settings.footer.or_else(|| preferences.text.footer.clone());
    request.page_numbers = settings.page_numbers || preferences.text.page_numbers;
    request.command_line = Some(std::env::args().collect::<Vec<_>>().join(" "));
    request
}

fn execute_get_default(system: &LpPrintSystem) -> Result<()> {
    let default = system
        .default_printer()
        .context("failed to query the default printer")?;
    match default {
        Some(name) => {
            println!("{name}");
            Ok(())
        }
        None => Err(anyhow::Error::new(PrintJobError::NoDefaultPrinter)),
    }
}

fn execute_set_default(system: &LpPrintSystem, args: SetDefaultArgs) -> Result<()> {
    let installed = system
        .installed_printers()
        .context("failed to list printers")?;
    let Some(name) = installed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&args.name))
    else {
        return Err(anyhow!(
            "{}. Valid printers: {}",
            PrintJobError::PrinterNotFound {
                name: args.name.clone()
            },
            installed.join(", ")
        ));
    };

    if let Err(err) = system.set_default_printer(name) {
        warn!("could not set the default printer to '{name}': {err}");
    }
    if args.passthru {
        match system.default_printer() {
            Ok(Some(current)) => println!("{current}"),
            Ok(None) => println!(),
            Err(err) => warn!("could not read the default printer: {err}"),
        }
    }
    Ok(())
}

fn execute_complete(system: &LpPrintSystem, args: CompleteArgs) -> Result<()> {
    let candidates = match args.kind {
        CompletionKind::Printers => {
            printer_names(system, &args.word).context("failed to list printers")?
        }
        CompletionKind::PaperSizes => {
            let capabilities = completion_capabilities(system, args.printer.as_deref())?;
            paper_size_names(&capabilities, &args.word)
        }
        CompletionKind::Fonts => font_names(&system.installed_fonts(), &args.word),
    };
    let mut stdout = io::stdout().lock();
    for candidate in candidates {
        writeln!(stdout, "{candidate}")?;
    }
    Ok(())
}

fn completion_capabilities(system: &LpPrintSystem, printer: Option<&str>) -> Result<PrinterCapabilities> {
    let printer = match printer {
        Some(name) => name.to_string(),
        None => system
            .default_printer()
            .ok()
            .flatten()
            .unwrap_or_else(|| VIRTUAL_PDF_PRINTER.to_string()),
    };
    system
        .capabilities(&printer)
        .with_context(|| format!("failed to query printer '{printer}'"))
}

fn execute_preferences_command(command: PreferencesCommand, prefs_path: &Path) -> Result<()> {
    match command {
        PreferencesCommand::Export(args) => export_preferences(args, prefs_path),
        PreferencesCommand::Import(args) => import_preferences(args, prefs_path),
    }
}

fn export_preferences(args: PreferencesExportArgs, prefs_path: &Path) -> Result<()> {
    let store = PreferencesStore::load(prefs_path)
        .with_context(|| format!("failed to load preferences from {}", prefs_path.display()))?;
    store
        .export_to(&args.output)
        .with_context(|| format!("failed to export preferences to {}", args.output.display()))?;
    println!("Exported preferences to {}", args.output.display());
    Ok(())
}

fn import_preferences(args: PreferencesImportArgs, prefs_path: &Path) -> Result<()> {
    let mut store = PreferencesStore::load(prefs_path)
        .with_context(|| format!("failed to load preferences from {}", prefs_path.display()))?;
    if !args.input.exists() {
        bail!("preferences file '{}' does not exist", args.input.display());
    }
    store
        .import_from(&args.input)
        .with_context(|| format!("failed to import preferences from {}", args.input.display()))?;
    println!("Imported preferences from {}", args.input.display());
    Ok(())
}

/// Launches the desktop's handler for `path` without waiting for it.
fn open_in_viewer(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Err(err) = command.spawn() {
        warn!("could not open {}: {err}", path.display());
    }
}
