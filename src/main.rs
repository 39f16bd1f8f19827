// heapviz: pan-and-zoom explorer for heap allocation histories

use std::io;
use std::path::{Path, PathBuf};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use heapviz::history::HeapHistory;
use heapviz::logging::{init_logger, LogSink};
use heapviz::ui::App;

/// Parsed command line
struct Options {
    input: PathBuf,
    summary: bool,
    log_file: Option<PathBuf>,
}

fn print_usage(program_name: &str) {
    eprintln!("Usage: {} <events.json> [--summary] [--log <file>]", program_name);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --summary     Print totals for the history instead of opening the viewer");
    eprintln!("  --log <file>  Write viewer logs to <file> (filter via HEAPVIZ_LOG)");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input = None;
    let mut summary = false;
    let mut log_file = None;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--summary" => summary = true,
            "--log" => match rest.next() {
                Some(path) => log_file = Some(PathBuf::from(path)),
                None => return Err("--log needs a file name".to_string()),
            },
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path => {
                if input.is_some() {
                    return Err(format!("Unexpected argument '{}'", path));
                }
                input = Some(PathBuf::from(path));
            }
        }
    }

    let input = input.ok_or_else(|| "No input file provided".to_string())?;
    Ok(Options {
        input,
        summary,
        log_file,
    })
}

fn print_summary(history: &HeapHistory, path: &Path) {
    let extent = history.global_extent();
    println!("{}", path.display());
    println!("  ticks      {}", history.current_tick());
    println!(
        "  blocks     {} ({} live)",
        history.blocks().len(),
        history.live_block_count()
    );
    println!("  conflicts  {}", history.conflicts().len());
    println!("  events     {}", history.events().len());
    println!("  addresses  {}", history.addresses().len());
    if !extent.is_empty() {
        println!(
            "  extent     {:#x} - {:#x}, ticks {} - {}",
            extent.min_address, extent.max_address, extent.min_tick, extent.max_tick
        );
    }
    for conflict in history.conflicts() {
        println!("  conflict   {}", conflict);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("heapviz");

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            print_usage(program_name);
            std::process::exit(1);
        }
    };

    if !options.input.exists() {
        eprintln!("Error: File '{}' not found", options.input.display());
        print_usage(program_name);
        std::process::exit(1);
    }

    let sink = if options.summary {
        LogSink::Stderr
    } else {
        options.log_file.clone().map_or(LogSink::Disabled, LogSink::File)
    };
    init_logger(sink)?;

    let mut history = HeapHistory::new();
    let loaded = match history.load_from_path(&options.input) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading {}: {}", options.input.display(), e);
            std::process::exit(1);
        }
    };

    if options.summary {
        print_summary(&history, &options.input);
        println!(
            "  records    {} applied, {} skipped, {} ignored",
            loaded.records, loaded.skipped, loaded.ignored
        );
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let name = options
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| options.input.display().to_string());
    let mut app = App::new(history, name);
    if loaded.skipped > 0 {
        app.status_message = format!("Loaded with {} malformed records skipped", loaded.skipped);
        app.is_error = true;
    }
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
