use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use jot::app::external_editor::ExternalEditor;
use jot::app::prompt::{self, PromptResult};
use jot::app::session::Session;
use jot::app::target::{self, Destination};
use jot::config::{self, Config, EditingMode, Settings};
use jot::model::buffer::LineBuffer;
use jot::services::{signal_handler, terminal_guard, terminal_modes, tracing_setup};
use std::path::PathBuf;
use std::process::ExitCode;

/// Multi-line text prompt with Emacs and vi line editing
#[derive(Parser, Debug)]
#[command(name = "jot")]
#[command(about = "Edit a multi-line message at the terminal", long_about = None)]
#[command(version)]
struct Args {
    /// File to edit; its previous contents are loaded and overwritten on accept
    #[arg(value_name = "FILENAME")]
    filename: Option<PathBuf>,

    /// Start with an empty buffer even if FILENAME exists
    #[arg(short = 'e')]
    empty: bool,

    /// Line printed before the prompt
    #[arg(short = 'b', value_name = "BANNER", default_value = "")]
    banner: String,

    /// Key bindings to use (overrides config and inputrc)
    #[arg(long, value_enum, value_name = "MODE")]
    mode: Option<EditingMode>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_settings(args: &Args) -> AnyhowResult<Settings> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let inputrc_mode = config::inputrc_path(&env_lookup)
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|contents| config::inputrc_editing_mode(&contents));

    Ok(Settings::resolve(&config, inputrc_mode, &env_lookup, args.mode))
}

fn run(args: Args) -> AnyhowResult<ExitCode> {
    let rust_log = std::env::var("RUST_LOG").ok();
    if let Some(log_file) = tracing_setup::log_destination(args.log_file.as_deref(), rust_log.as_deref())
    {
        tracing_setup::init_global(&log_file);
    }
    tracing::info!("jot starting");

    let settings = load_settings(&args)?;
    tracing::debug!(?settings, "Effective settings");

    signal_handler::install_signal_handlers().context("Failed to install signal handlers")?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        terminal_modes::emergency_cleanup();
        terminal_guard::emergency_restore();
        original_hook(panic);
    }));

    let initial = target::load_initial(args.filename.as_deref(), args.empty)?;
    let editor = ExternalEditor::new(settings.editor.clone(), settings.scratch_dir.clone());
    let session = Session::new(
        LineBuffer::from_text(initial),
        settings.editing_mode,
        editor,
    );

    match prompt::run(session, &args.banner, settings.bell)? {
        PromptResult::Accepted(text) => {
            let destination = Destination::from_arg(args.filename.as_deref());
            target::write_result(&destination, &text)?;
            Ok(ExitCode::SUCCESS)
        }
        PromptResult::Interrupted => {
            signal_handler::raise_interrupt()?;
            Ok(ExitCode::from(130))
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("jot: {e:#}");
            ExitCode::FAILURE
        }
    }
}
