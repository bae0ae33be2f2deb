//! Inkshade - theme preferences and markdown editing from the terminal.
//!
//! # Usage
//!
//! ```bash
//! inkshade theme show
//! inkshade theme set dark
//! inkshade theme watch
//! inkshade preview --watch README.md
//! inkshade edit README.md --action bold --select 0..5
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use inkshade::config::{
    ConfigFlags, StorePaths, clear_config_flags, default_store_dir, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use inkshade::editor::{
    ComrakConverter, EditorContainer, EditorMarkup, MarkdownConverter, TextArea, ToolbarAction,
};
use inkshade::theme::scheme::TerminalScheme;
use inkshade::theme::store::{CookieFile, FileStore};
use inkshade::theme::sync::{HttpThemeSync, NoSync, ThemeSync};
use inkshade::theme::{Preference, ThemeManager, ThemeRoot};
use inkshade::watcher::FileWatcher;

const WATCH_DEBOUNCE: Duration = Duration::from_millis(100);
const WATCH_POLL: Duration = Duration::from_millis(50);

/// Theme preferences and markdown editing from the terminal
#[derive(Parser, Debug)]
#[command(name = "inkshade", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Theme assumed when nothing is stored yet (light or dark)
    #[arg(long, global = true, value_enum)]
    theme: Option<Preference>,

    /// Directory holding store.json and cookies.txt
    #[arg(long, global = true, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Base URL of the server to push theme changes to
    #[arg(long, global = true, value_name = "URL")]
    sync_url: Option<String>,

    /// Never push theme changes to a server
    #[arg(long, global = true)]
    no_sync: bool,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or change the theme preference
    Theme {
        #[command(subcommand)]
        action: ThemeCommand,
    },
    /// Render a markdown file to HTML
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Re-render whenever the file changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Apply an editor action to a file's text and print the result
    Edit {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Toolbar action id, `tab` or `shift-tab`
        #[arg(long)]
        action: EditAction,

        /// Selection as `start..end` character offsets
        #[arg(long, value_parser = parse_selection, default_value = "0..0")]
        select: (usize, usize),
    },
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    /// Print the stored preference and the theme it resolves to
    Show,
    /// Set and persist a preference
    Set {
        #[arg(value_enum)]
        preference: Preference,
    },
    /// Rotate light, dark, auto
    Cycle,
    /// Follow preference changes made by other instances
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditAction {
    Toolbar(ToolbarAction),
    Tab { shift: bool },
}

impl std::str::FromStr for EditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tab" => Ok(Self::Tab { shift: false }),
            "shift-tab" => Ok(Self::Tab { shift: true }),
            other => other
                .parse::<ToolbarAction>()
                .map(Self::Toolbar)
                .map_err(|err| err.to_string()),
        }
    }
}

fn parse_selection(value: &str) -> Result<(usize, usize), String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected start..end, got `{value}`"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("bad selection start: {err}"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("bad selection end: {err}"))?;
    Ok((start, end))
}

fn build_theme_manager(flags: &ConfigFlags) -> Result<ThemeManager> {
    let store_dir = flags.store_dir.clone().unwrap_or_else(default_store_dir);
    let paths = StorePaths::in_dir(&store_dir);

    let sync: Box<dyn ThemeSync> = match (&flags.sync_url, flags.no_sync) {
        (Some(url), false) => Box::new(
            HttpThemeSync::new(url).with_context(|| format!("Invalid sync URL {url}"))?,
        ),
        _ => Box::new(NoSync),
    };

    // A concrete --theme plays the part of the server-rendered attribute.
    let root = match flags.theme {
        Some(Preference::Light) => ThemeRoot::with_server_theme("light"),
        Some(Preference::Dark) => ThemeRoot::with_server_theme("dark"),
        Some(Preference::Auto) | None => ThemeRoot::new(),
    };

    Ok(ThemeManager::builder()
        .local_store(FileStore::new(paths.local))
        .cookie_store(CookieFile::new(paths.cookies))
        .scheme(TerminalScheme::detect())
        .sync(sync)
        .root(root)
        .toggle_buttons(1)
        .build())
}

fn run_theme(command: &ThemeCommand, flags: &ConfigFlags) -> Result<()> {
    let mut manager = build_theme_manager(flags)?;
    match command {
        ThemeCommand::Show => {
            let (preference, resolved) = manager.resolve_initial();
            println!("preference: {preference}");
            println!("theme: {resolved}");
        }
        ThemeCommand::Set { preference } => {
            manager.init();
            let event = manager.set_preference(*preference);
            manager.sync_with_server();
            manager.restore_transitions();
            println!("{} ({})", event.theme, event.actual_theme);
        }
        ThemeCommand::Cycle => {
            manager.init();
            let event = manager.activate_toggle();
            manager.restore_transitions();
            if let Some(button) = manager.toggle_buttons().first() {
                println!("{}", button.label);
            } else {
                println!("{} ({})", event.theme, event.actual_theme);
            }
        }
        ThemeCommand::Watch => watch_theme(&mut manager, flags)?,
    }
    manager.flush_sync();
    Ok(())
}

fn watch_theme(manager: &mut ThemeManager, flags: &ConfigFlags) -> Result<()> {
    let store_dir = flags.store_dir.clone().unwrap_or_else(default_store_dir);
    std::fs::create_dir_all(&store_dir)
        .with_context(|| format!("Failed to create store dir {}", store_dir.display()))?;
    let paths = StorePaths::in_dir(&store_dir);

    manager.subscribe(|event| match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::warn!(%err, "failed to encode theme event"),
    });
    let (preference, resolved) = manager.init();
    manager.restore_transitions();
    println!("watching {} ({preference}, {resolved})", store_dir.display());

    let mut watcher = FileWatcher::for_paths(&[paths.local, paths.cookies], WATCH_DEBOUNCE)
        .context("Failed to watch theme stores")?;
    loop {
        watcher.wait_for_change(WATCH_POLL);
        manager.reload_from_store();
    }
}

fn emit(html: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(html.as_bytes())?;
    stdout.flush().context("Failed to write output")
}

fn render_file(converter: &dyn MarkdownConverter, file: &Path) -> Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    converter
        .markdown_to_html(&text)
        .with_context(|| format!("Failed to render {}", file.display()))
}

fn run_preview(file: &Path, watch: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let converter = ComrakConverter;
    emit(&render_file(&converter, file)?)?;
    if !watch {
        return Ok(());
    }

    let mut watcher =
        FileWatcher::new(file, WATCH_DEBOUNCE).context("Failed to watch markdown file")?;
    loop {
        watcher.wait_for_change(WATCH_POLL);
        match render_file(&converter, file) {
            Ok(html) => emit(&html)?,
            // Keep the last good render, like the preview pane does.
            Err(err) => tracing::warn!("{err:#}"),
        }
    }
}

fn run_edit(file: &Path, action: EditAction, (start, end): (usize, usize)) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut markup = EditorMarkup {
        textarea: Some(TextArea::new(text)),
        ..EditorMarkup::default()
    };
    let mut editor = EditorContainer::attach(
        file.display().to_string(),
        &mut markup,
        Rc::new(ComrakConverter),
    )
    .context("Editor has no textarea")?;
    editor.set_selection(start, end);

    let changed = match action {
        EditAction::Toolbar(action) => editor.apply(action),
        EditAction::Tab { shift } => editor.keydown_tab(shift),
    };
    if !changed {
        tracing::warn!(?action, "action left the text unchanged");
    }
    emit(&editor.text())?;
    let selection = editor.selection();
    eprintln!("selection: {}..{}", selection.start, selection.end);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    tracing::debug!(?effective, "effective configuration");

    match cli.command {
        Some(Command::Theme { action }) => run_theme(&action, &effective),
        Some(Command::Preview { file, watch }) => run_preview(&file, watch || effective.watch),
        Some(Command::Edit {
            file,
            action,
            select,
        }) => run_edit(&file, action, select),
        None if cli.save || cli.clear => Ok(()),
        None => run_theme(&ThemeCommand::Show, &effective),
    }
}
