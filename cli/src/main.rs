mod logging;
mod render;
mod trace;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sidetabs::{
    Applied, FilterOutcome, FollowUp, MatchMode, SearchEngine, TabEvent, TabId, TabList, WindowId,
};

use crate::trace::{Line, Record};

/// sidetabs - replay recorded browser tab events through the sidebar mirror
#[derive(Parser)]
#[command(name = "sidetabs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Level for library diagnostics on stderr (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: log::LevelFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a trace and print the resulting sidebar
    Replay(ReplayArgs),
    /// Replay a trace and check the mirror at every `expect` record
    Verify {
        /// JSON-lines trace file
        trace: PathBuf,

        /// Window the sidebar belongs to (default: window of the first populated tab)
        #[arg(long, value_name = "ID")]
        window: Option<u32>,
    },
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON-lines trace file
    trace: PathBuf,

    /// Window the sidebar belongs to (default: window of the first populated tab)
    #[arg(long, value_name = "ID")]
    window: Option<u32>,

    /// Filter the printed sidebar with this search query
    #[arg(long, value_name = "QUERY")]
    query: Option<String>,

    /// Match queries as plain substrings instead of fuzzy
    #[arg(long)]
    substring: bool,

    /// Lines available for tab rows
    #[arg(long, value_name = "N", default_value_t = 20)]
    rows: usize,

    /// Columns available per row
    #[arg(long, value_name = "N", default_value_t = 40)]
    width: usize,

    /// Print the sidebar after every record
    #[arg(long)]
    step: bool,

    /// Plain text without ANSI styling
    #[arg(long)]
    no_colour: bool,
}

// ============================================================================
// Replay
// ============================================================================

struct Replayer {
    list: TabList,
    search: SearchEngine,
    filter: Option<FilterOutcome>,
    /// Attached tabs waiting for a `metadata` record.
    awaiting_metadata: HashSet<TabId>,
    checked: usize,
}

impl Replayer {
    fn new(window_id: WindowId, mode: MatchMode) -> Self {
        Replayer {
            list: TabList::new(window_id),
            search: SearchEngine::new(mode),
            filter: None,
            awaiting_metadata: HashSet::new(),
            checked: 0,
        }
    }

    fn note(&mut self, line: usize, applied: Applied) {
        for follow_up in applied.follow_ups {
            match follow_up {
                FollowUp::FetchMetadata(tab_id) => {
                    self.awaiting_metadata.insert(tab_id);
                }
                // Traces carry no live host; a later populate record recovers
                FollowUp::Resync => log::warn!(
                    "line {}: event contradicts the mirror, a populate record is needed",
                    line
                ),
                _ => {}
            }
        }
    }

    fn refilter(&mut self) {
        if self.search.is_active() {
            let query = self.search.query().to_string();
            self.filter = Some(self.search.filter(&query, &mut self.list));
        }
    }

    fn apply(&mut self, line: &Line) -> Result<()> {
        match &line.record {
            Record::Populate(tabs) => {
                let applied = self.list.populate(tabs.clone());
                self.awaiting_metadata.clear();
                self.note(line.number, applied);
                self.refilter();
            }
            Record::Event(event) => {
                let applied = self.list.apply(event);
                // A tab arriving in this window ends any search
                if matches!(event, TabEvent::Created { .. } | TabEvent::Attached { .. })
                    && !applied.is_empty()
                    && self.search.is_active()
                {
                    self.filter = Some(self.search.filter("", &mut self.list));
                }
                self.note(line.number, applied);
            }
            Record::Metadata(snapshot) => {
                if !self.awaiting_metadata.remove(&snapshot.id) {
                    log::warn!(
                        "line {}: metadata for tab {} that was never attached",
                        line.number,
                        snapshot.id
                    );
                }
                let applied = self.list.apply_metadata(snapshot);
                self.note(line.number, applied);
            }
            Record::Search(query) => {
                self.filter = Some(self.search.filter(query, &mut self.list));
            }
            Record::Expect(tabs) => {
                self.list
                    .verify_against(tabs)
                    .with_context(|| format!("line {}: mirror diverged from host", line.number))?;
                self.checked += 1;
            }
        }
        Ok(())
    }
}

fn window_for(lines: &[Line], window: Option<u32>) -> Result<WindowId> {
    match window {
        Some(id) => Ok(WindowId(id)),
        None => trace::first_window(lines)
            .context("no --window given and the trace populates no tabs"),
    }
}

struct View {
    rows: usize,
    width: usize,
    colour: bool,
}

fn print_sidebar(replayer: &mut Replayer, query: Option<&str>, view: &View) {
    let filter = match query {
        Some(query) => Some(replayer.search.filter(query, &mut replayer.list)),
        None => replayer.filter,
    };
    let tabs = replayer.list.visible_tabs();
    for line in render::render_sidebar(&tabs, filter, view.rows, view.width, view.colour) {
        println!("{}", line.part);
    }
}

fn do_replay(args: ReplayArgs) -> Result<()> {
    let lines = trace::read(&args.trace)?;
    let window_id = window_for(&lines, args.window)?;
    let mode = if args.substring {
        MatchMode::Substring
    } else {
        MatchMode::Fuzzy
    };
    let mut replayer = Replayer::new(window_id, mode);
    let view = View {
        rows: args.rows,
        width: args.width,
        colour: !args.no_colour,
    };
    let query = args.query.as_deref();

    for line in &lines {
        replayer.apply(line)?;
        if args.step {
            println!("-- line {} --", line.number);
            print_sidebar(&mut replayer, query, &view);
        }
    }
    if !args.step {
        print_sidebar(&mut replayer, query, &view);
    }
    if !replayer.awaiting_metadata.is_empty() {
        log::warn!(
            "{} attached tabs never received metadata",
            replayer.awaiting_metadata.len()
        );
    }
    Ok(())
}

fn do_verify(path: PathBuf, window: Option<u32>) -> Result<()> {
    let lines = trace::read(&path)?;
    let window_id = window_for(&lines, window)?;
    let mut replayer = Replayer::new(window_id, MatchMode::default());
    for line in &lines {
        replayer.apply(line)?;
    }
    eprintln!(
        "sidetabs: {} records, {} checkpoints passed ({})",
        lines.len(),
        replayer.checked,
        path.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match cli.command {
        Commands::Replay(args) => do_replay(args),
        Commands::Verify { trace, window } => do_verify(trace, window),
    }
}
