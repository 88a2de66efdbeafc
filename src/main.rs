use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use jellypie::app::{
    CloseResponse, Dialogs, Notice, OpenFileRegistry, ReloadResponse, RemovedResponse, Session,
    UnsavedRow, WindowCloseOutcome, WindowCloseResponse,
};
use jellypie::config_io::{ConfigStore, DirectoryContext};
use jellypie::input::commands::{Action, Dispatch};
use jellypie::input::keybindings::{parse_accelerator, Keymap};
use jellypie::services::elevated::NoElevation;
use jellypie::services::tracing_setup;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A lightweight to-do list and plain text editor
#[derive(Parser, Debug)]
#[command(name = "jellypie")]
#[command(about = "A to-do list and plain text editor", long_about = None)]
#[command(version)]
struct Args {
    /// Files to open. With none, the configured to-do file is opened.
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the paths used by jellypie and exit
    #[arg(long)]
    show_paths: bool,

    /// Never retry failed saves through pkexec
    #[arg(long)]
    no_elevate: bool,
}

/// Dialogs answered on the terminal
struct StdinDialogs;

impl StdinDialogs {
    fn ask(&self, question: &str) -> String {
        print!("{question} ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return String::new();
        }
        answer.trim().to_string()
    }

    fn choose(&self, question: &str, choices: &[&str]) -> usize {
        let prompt = format!("{question} [{}]", choices.join("/"));
        let answer = self.ask(&prompt).to_lowercase();
        choices
            .iter()
            .position(|choice| choice.to_lowercase().starts_with(&answer) && !answer.is_empty())
            .unwrap_or(0)
    }
}

impl Dialogs for StdinDialogs {
    fn confirm_close(&mut self, label: &str) -> CloseResponse {
        match self.choose(
            &format!("Save changes to \"{label}\" before closing?"),
            &["Cancel", "Discard", "Save"],
        ) {
            1 => CloseResponse::Discard,
            2 => CloseResponse::Save,
            _ => CloseResponse::Cancel,
        }
    }

    fn confirm_window_close(&mut self, rows: &mut [UnsavedRow]) -> WindowCloseResponse {
        println!("Unsaved documents:");
        for (index, row) in rows.iter().enumerate() {
            println!("  {}. {}", index + 1, row.label);
        }
        let answer = self.choose(
            "Save changes before closing?",
            &["Cancel", "Discard all", "Save selected"],
        );
        match answer {
            1 => WindowCloseResponse::DiscardAll,
            2 => {
                let skip = self.ask("Numbers to leave unsaved (blank for none):");
                for number in skip.split_whitespace().filter_map(|n| n.parse::<usize>().ok()) {
                    if let Some(row) = number.checked_sub(1).and_then(|i| rows.get_mut(i)) {
                        row.checked = false;
                    }
                }
                WindowCloseResponse::SaveSelected
            }
            _ => WindowCloseResponse::Cancel,
        }
    }

    fn choose_save_path(&mut self, suggested_name: &str) -> Option<PathBuf> {
        let answer = self.ask(&format!("Save as [{suggested_name}]:"));
        match answer.as_str() {
            "" => None,
            path => Some(PathBuf::from(path)),
        }
    }

    fn choose_open_paths(&mut self) -> Vec<PathBuf> {
        self.ask("Files to open:")
            .split_whitespace()
            .map(PathBuf::from)
            .collect()
    }

    fn confirm_reload(&mut self, label: &str) -> ReloadResponse {
        match self.choose(
            &format!("\"{label}\" changed on disk. Reload it?"),
            &["Reload", "Cancel"],
        ) {
            0 => ReloadResponse::Reload,
            _ => ReloadResponse::Cancel,
        }
    }

    fn confirm_removed(&mut self, label: &str) -> RemovedResponse {
        match self.choose(
            &format!("\"{label}\" was removed from disk. Save it again?"),
            &["Save As", "Cancel"],
        ) {
            0 => RemovedResponse::SaveAs,
            _ => RemovedResponse::Cancel,
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("{notice}");
    }
}

const HELP: &str = "\
Commands:
  <action>            run an action (see `actions`)
  <accelerator>       run the action bound to e.g. <Control>s
  insert <text>       type text at the cursor (\\n for newline)
  bookmark <line>     toggle a bookmark on a line
  status              show line, column, mode and file type
  cursor <offset>     move the cursor
  select <start> <end>
  find <pattern>      set the search pattern and show the find bar
  case|word|regex on|off
  replace <text>      replace the selected match
  replace_all <text>
  goto <line>
  switch <n>          activate the n-th tab
  print               show the active document
  tabs                list tabs
  keys                list key bindings
  get <key> / set <key> <json>
  help";

fn print_tabs(session: &Session) {
    for (index, key) in session.tab_keys().iter().enumerate() {
        let Some(tab) = session.tab(*key) else {
            continue;
        };
        let marker = if session.active_tab() == Some(*key) { '>' } else { ' ' };
        let modified = if tab.is_modified() { "*" } else { "" };
        let loading = if tab.is_loading() { " (loading)" } else { "" };
        println!(
            "{marker} {}. {modified}{} [{}]{loading}",
            index + 1,
            tab.label,
            tab.file_type
        );
    }
}

fn print_active(session: &Session) {
    let Some(tab) = session.active_tab().and_then(|key| session.tab(key)) else {
        return;
    };
    println!("--- {} ---", session.window_title());
    print!("{}", tab.buffer.text());
    if !tab.buffer.text().ends_with('\n') {
        println!();
    }
    if tab.find_bar_visible {
        println!("[find: {:?}] {}", tab.search.settings.pattern, tab.search.result_label);
    }
    let bookmarks = tab.buffer.bookmarked_lines();
    if !bookmarks.is_empty() {
        let lines: Vec<String> = bookmarks.iter().map(|line| (line + 1).to_string()).collect();
        println!("[bookmarks: {}]", lines.join(", "));
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Run one shell command; returns false when the window closed
fn run_command(
    line: &str,
    session: &mut Session,
    store: &mut ConfigStore,
    keymap: &Keymap,
    dialogs: &mut StdinDialogs,
) -> bool {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest),
        None => (line, ""),
    };

    let action = Action::from_name(command)
        .or_else(|| parse_accelerator(command).and_then(|combo| keymap.resolve(&combo)));
    if let Some(action) = action {
        match session.dispatch(action, dialogs) {
            Dispatch::WindowClosed(WindowCloseOutcome::Closed) => return false,
            Dispatch::WindowClosed(outcome) => println!("Window not closed: {outcome:?}"),
            Dispatch::TabClosed(outcome) => tracing::debug!("Close tab: {:?}", outcome),
            Dispatch::GotoLine(current) => println!("Go to line (current {current}): use `goto <n>`"),
            Dispatch::Shell(Action::QuickHelp) => println!("{HELP}"),
            Dispatch::Shell(action) => println!("{} is not available in this shell", action),
            Dispatch::Ignored => println!("Nothing to do"),
            Dispatch::Handled => {}
        }
        return true;
    }

    let active = session.active_tab();
    match command {
        "help" => println!("{HELP}"),
        "actions" => {
            for action in Action::ALL {
                println!("  {:<18} {}", action.name(), action.description());
            }
        }
        "keys" => {
            for (accel, action) in keymap.bindings() {
                println!("  {:<22} {}", accel, action);
            }
        }
        "tabs" => print_tabs(session),
        "print" => print_active(session),
        "insert" => {
            let text = rest.replace("\\n", "\n");
            if !session.type_text(&text) {
                println!("The document is not editable");
            }
        }
        "bookmark" => match rest
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|line| session.toggle_bookmark(line))
        {
            Some(true) => println!("Bookmark added"),
            Some(false) => println!("Bookmark removed"),
            None => println!("No such line"),
        },
        "status" => {
            if let Some(status) = session.status_line() {
                println!("{status}");
            }
        }
        "cursor" => {
            if let (Some(tab), Ok(offset)) = (
                active.and_then(|key| session.tab_mut(key)),
                rest.trim().parse::<usize>(),
            ) {
                tab.buffer.place_cursor(offset);
            }
        }
        "select" => {
            let bounds: Vec<usize> = rest
                .split_whitespace()
                .filter_map(|n| n.parse().ok())
                .collect();
            if let (Some(tab), [start, end]) =
                (active.and_then(|key| session.tab_mut(key)), bounds.as_slice())
            {
                tab.buffer.select_range(*start, *end);
            }
        }
        "undo" | "redo" => {
            if let Some(tab) = active.and_then(|key| session.tab_mut(key)) {
                if command == "undo" {
                    tab.buffer.undo();
                } else {
                    tab.buffer.redo();
                }
            }
        }
        "find" => {
            session.show_find_bar();
            session.set_search_text(rest);
        }
        "case" | "word" | "regex" => match parse_switch(rest.trim()) {
            Some(enabled) if command == "case" => session.set_case_sensitive(enabled),
            Some(enabled) if command == "word" => session.set_whole_word(enabled),
            Some(enabled) => session.set_use_regex(enabled),
            None => println!("Expected on or off"),
        },
        "replace" => {
            if !session.replace_one(rest) {
                println!("The selection is not a match");
            }
        }
        "replace_all" => println!("Replaced {}", session.replace_all(rest)),
        "goto" => {
            if session.go_to_line(rest).is_none() {
                println!("Not a line number");
            }
        }
        "switch" => {
            let key = rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| session.tab_keys().get(index).copied());
            match key {
                Some(key) => {
                    session.switch_active_tab(key, dialogs);
                }
                None => println!("No such tab"),
            }
        }
        "get" => match store.get(rest.trim()) {
            Some(value) => println!("{value}"),
            None => println!("Unknown key"),
        },
        "set" => {
            let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
            match serde_json::from_str::<serde_json::Value>(value) {
                Ok(value) => {
                    if let Err(e) = store.set(key, value) {
                        println!("{e}");
                    }
                }
                Err(e) => println!("Invalid value: {e}"),
            }
        }
        "" => {}
        other => println!("Unknown command {other:?}; try `help`"),
    }
    true
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let dir_context = DirectoryContext::from_system().context("Failed to locate data directory")?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| dir_context.config_path());
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(tracing_setup::default_log_path);

    if args.show_paths {
        println!("Config file: {}", config_path.display());
        println!("Data dir:    {}", dir_context.data_dir.display());
        println!("Log file:    {}", log_file.display());
        return Ok(());
    }

    let mut store = ConfigStore::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(store.config())
            .context("Failed to serialize config")?;
        println!("{json}");
        return Ok(());
    }

    tracing_setup::init_global(&log_file);
    tracing::info!("Starting jellypie with config {:?}", config_path);

    let keymap = Keymap::from_config(store.config());
    let mut dialogs = StdinDialogs;
    let mut session = Session::new(store.config().clone(), OpenFileRegistry::shared());
    if args.no_elevate {
        session = session.with_elevated_writer(Box::new(NoElevation));
    }

    if args.files.is_empty() {
        session.open_startup_file(&mut dialogs);
    } else {
        for result in session.open_files(&args.files, &mut dialogs) {
            if let Err(e) = result {
                tracing::warn!("{}", e);
            }
        }
        if session.tab_count() == 0 {
            session.new_tab();
        }
    }
    print_tabs(&session);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        session.pump(Instant::now(), &mut dialogs);
        print!("{}> ", session.window_title());
        io::stdout().flush().context("Failed to write prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read command")?;
        if read == 0 {
            // No more answers can be read, so unsaved work cannot be confirmed
            if session.close_window(&mut dialogs) != WindowCloseOutcome::Closed {
                tracing::warn!("Input closed with unsaved documents");
            }
            break;
        }
        if !run_command(line.trim_end(), &mut session, &mut store, &keymap, &mut dialogs) {
            break;
        }
        // Let queued navigation and background loads settle before the next prompt
        session.wait_for_messages(Duration::from_millis(10), &mut dialogs);
    }

    tracing::info!("Exiting");
    Ok(())
}
