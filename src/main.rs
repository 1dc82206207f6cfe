use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use thermowatch::app::View;
use thermowatch::{
    events, export, ui, App, CommandAlertSink, FanoutAlertSink, FileSource, Ingestor,
    LineSource, LogAlertSink, RecordingAlertSink, SerialSource, Settings, SharedEngine,
    StreamSource,
};

#[derive(Parser, Debug)]
#[command(name = "thermowatch")]
#[command(about = "Serial temperature telemetry dashboard with threshold alerts")]
struct Args {
    /// Serial device to read from (overrides serial.port)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate (overrides serial.baud_rate)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read lines from a TCP endpoint instead of a serial port (host:port)
    #[arg(short, long, conflicts_with_all = ["replay", "port"])]
    connect: Option<String>,

    /// Replay a captured file, one line per ingestion tick
    #[arg(short, long, conflicts_with_all = ["connect", "port"])]
    replay: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// High threshold in °C: alerts and red markers at or above this value
    #[arg(long)]
    high: Option<f64>,

    /// Low threshold in °C: green markers at or below this value
    #[arg(long)]
    low: Option<f64>,

    /// Number of samples kept for the chart (0 keeps everything)
    #[arg(long)]
    retention: Option<usize>,

    /// Samples per unit of the time axis
    #[arg(long)]
    samples_per_unit: Option<f64>,

    /// Ingestion period (e.g., "1s", "500ms")
    #[arg(long)]
    ingest_interval: Option<String>,

    /// Presentation refresh period (e.g., "1s", "250ms")
    #[arg(long)]
    render_interval: Option<String>,

    /// External notifier run for each alert, e.g. "notify-send -u critical"
    #[arg(long)]
    alert_command: Option<String>,

    /// Write logs to this file (the terminal UI owns stdout)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run without the terminal UI, logging the labels instead
    #[arg(long)]
    headless: bool,

    /// Replay the whole capture, export state to a JSON file and exit
    #[arg(short, long, requires = "replay")]
    export: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref port) = self.port {
            settings.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            settings.serial.baud_rate = baud;
        }
        if let Some(high) = self.high {
            settings.thresholds.high = high;
        }
        if let Some(low) = self.low {
            settings.thresholds.low = low;
        }
        if let Some(retention) = self.retention {
            settings.series.retention = Some(retention);
        }
        if let Some(spu) = self.samples_per_unit {
            settings.series.samples_per_unit = spu;
        }
        if let Some(ref period) = self.ingest_interval {
            settings.ticks.ingest = period.clone();
        }
        if let Some(ref period) = self.render_interval {
            settings.ticks.render = period.clone();
        }
        if let Some(ref command) = self.alert_command {
            settings.alert.command = Some(command.clone());
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    init_logging(&args)?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        let Some(ref replay) = args.replay else {
            bail!("--export needs --replay");
        };
        return export_replay(replay, export_path, &settings);
    }

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source = open_source(&rt, &args, &settings)?;
    let description = source.description().to_string();

    let engine = SharedEngine::new(settings.engine_config());
    let recorder = RecordingAlertSink::default();
    let alerts = build_alert_sink(&settings, recorder.clone())?;

    let handle = Ingestor::new(engine.clone(), source, Box::new(alerts))
        .spawn(settings.ticks.ingest_period()?);
    let render_period = settings.ticks.render_period()?;

    let result = if args.headless {
        rt.block_on(run_headless(engine, render_period))
    } else {
        let app = App::new(engine, recorder, &description);
        run_tui(app, render_period)
    };

    rt.block_on(handle.shutdown());
    info!("stopped");
    result
}

/// Logs go to stderr when headless, to `--log-file` under the UI, and
/// nowhere otherwise.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(ref path) = args.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if args.headless || args.export.is_some() {
        builder.with_writer(io::stderr).init();
    } else {
        builder.with_writer(io::sink).init();
    }
    Ok(())
}

/// Open the configured line source. Failing to open it is fatal.
fn open_source(
    rt: &tokio::runtime::Runtime,
    args: &Args,
    settings: &Settings,
) -> Result<Box<dyn LineSource>> {
    if let Some(ref addr) = args.connect {
        info!(addr = %addr, "connecting");
        let stream = rt
            .block_on(tokio::net::TcpStream::connect(addr))
            .with_context(|| format!("failed to connect to {}", addr))?;
        return Ok(Box::new(StreamSource::spawn(stream, addr)));
    }

    if let Some(ref path) = args.replay {
        return Ok(Box::new(FileSource::open(path)?));
    }

    let serial = SerialSource::open(&settings.serial.port, settings.serial.baud_rate)?;
    Ok(Box::new(serial))
}

fn build_alert_sink(settings: &Settings, recorder: RecordingAlertSink) -> Result<FanoutAlertSink> {
    let mut fanout = FanoutAlertSink::new().with(LogAlertSink).with(recorder);
    if let Some(ref command) = settings.alert.command {
        fanout = fanout.with(CommandAlertSink::parse(command)?);
    }
    Ok(fanout)
}

/// Ingest a whole capture without pacing and write the resulting state.
fn export_replay(replay: &Path, export_path: &Path, settings: &Settings) -> Result<()> {
    let source = FileSource::open(replay)?;
    let engine = SharedEngine::new(settings.engine_config());
    let mut ingestor = Ingestor::new(engine.clone(), Box::new(source), Box::new(LogAlertSink));
    let outcomes = ingestor.drain();

    export::write_snapshot(&engine.snapshot(), export_path)?;
    info!(
        lines = outcomes.len(),
        path = %export_path.display(),
        "exported replay state"
    );
    println!("Exported state to: {}", export_path.display());
    Ok(())
}

/// Presentation loop without a terminal: log the labels every period.
async fn run_headless(engine: SharedEngine, period: Duration) -> Result<()> {
    let mut timer = tokio::time::interval(period);
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let snapshot = engine.snapshot();
                if snapshot.source_error != last_error {
                    if let Some(ref e) = snapshot.source_error {
                        warn!(error = %e, "source unavailable");
                    }
                    last_error = snapshot.source_error.clone();
                }
                let labels = &snapshot.labels;
                if let Some(ref current) = labels.current {
                    info!(
                        max = labels.max.as_deref().unwrap_or("--"),
                        min = labels.min.as_deref().unwrap_or("--"),
                        samples = snapshot.len,
                        "{}",
                        current
                    );
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// Run the TUI over a running engine
fn run_tui(mut app: App, render_period: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.refresh();

    let result = run_app(&mut terminal, &mut app, render_period);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    render_period: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 14;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5u16.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(3), // Labels
                Constraint::Length(1), // Tabs
                Constraint::Min(6),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_labels(frame, app, chunks[1]);
            ui::common::render_tabs(frame, app, chunks[2]);

            match app.current_view {
                View::Chart => ui::chart::render(frame, app, chunks[3]),
                View::Readings => ui::readings::render(frame, app, chunks[3]),
            }

            ui::common::render_status_bar(frame, app, chunks[4]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Presentation tick
        if last_refresh.elapsed() >= render_period {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
