mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, Home};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use globe_labels::data::{self, LabelSources};
use globe_labels::labels::{DeclutterConfig, LabelLayer};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Country and city labels on a terminal globe
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding countries_points.geojson and cities_big.geojson
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Country label points, overrides the file in --data-dir
    #[arg(long)]
    countries: Option<PathBuf>,

    /// City label points, overrides the file in --data-dir
    #[arg(long)]
    cities: Option<PathBuf>,

    /// Drop cities with a known population below this
    #[arg(long)]
    min_city_population: Option<u64>,

    #[command(flatten)]
    declutter: DeclutterArgs,

    /// Initial camera longitude in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lon: f64,

    /// Initial camera latitude in degrees
    #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
    lat: f64,

    /// Initial camera height above the ellipsoid in meters
    #[arg(long, default_value_t = 1.2e7)]
    height: f64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Overrides for the decluttering thresholds
#[derive(clap::Args, Debug)]
struct DeclutterArgs {
    /// Camera height (m) above which no city is shown
    #[arg(long)]
    city_enable_height: Option<f64>,

    /// Camera height (m) at or below which the near city cap applies
    #[arg(long)]
    city_soft_height: Option<f64>,

    #[arg(long)]
    max_city_near: Option<usize>,

    #[arg(long)]
    max_city_far: Option<usize>,

    /// City collision cell size in pixels
    #[arg(long)]
    city_grid: Option<f64>,

    /// Country collision cell size in pixels
    #[arg(long)]
    country_grid: Option<f64>,

    /// Off-canvas margin in pixels still treated as visible
    #[arg(long)]
    viewport_padding: Option<f64>,
}

impl DeclutterArgs {
    fn config(&self) -> DeclutterConfig {
        let defaults = DeclutterConfig::default();
        DeclutterConfig {
            city_enable_height_m: self.city_enable_height.unwrap_or(defaults.city_enable_height_m),
            city_soft_height_m: self.city_soft_height.unwrap_or(defaults.city_soft_height_m),
            max_city_near: self.max_city_near.unwrap_or(defaults.max_city_near),
            max_city_far: self.max_city_far.unwrap_or(defaults.max_city_far),
            city_grid_px: self.city_grid.unwrap_or(defaults.city_grid_px),
            country_grid_px: self.country_grid.unwrap_or(defaults.country_grid_px),
            viewport_padding_px: self.viewport_padding.unwrap_or(defaults.viewport_padding_px),
        }
    }
}

impl Args {
    fn sources(&self) -> LabelSources {
        let mut sources = LabelSources::in_dir(&self.data_dir);
        if let Some(path) = &self.countries {
            sources.countries = path.clone();
        }
        if let Some(path) = &self.cities {
            sources.cities = path.clone();
        }
        sources.min_city_population = self.min_city_population;
        sources
    }
}

/// Logs go to a file when asked, since stderr is hidden behind the alternate screen.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Load labels from disk, falling back to the built-in sample when no files exist.
/// Returns a short description of where the labels came from.
fn load_labels(layer: &mut LabelLayer, sources: &LabelSources) -> Result<String> {
    if sources.exist() {
        let counts = layer
            .load_and_build(sources)
            .context("loading label data")?;
        tracing::info!(?counts, "loaded labels from disk");
        Ok("data".to_string())
    } else {
        tracing::warn!(
            countries = %sources.countries.display(),
            cities = %sources.cities.display(),
            "label files not found, using the sample world"
        );
        let (countries, cities) = data::sample_world();
        layer.build(countries, cities);
        Ok("sample".to_string())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = args.declutter.config();
    config.validate().context("invalid declutter settings")?;

    // Load before touching the terminal so errors print normally
    let mut layer = LabelLayer::headless(config);
    let source = load_labels(&mut layer, &args.sources())?;
    let home = Home {
        lon: args.lon,
        lat: args.lat,
        height: args.height,
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, layer, home, source);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for rotating and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        // Horizontal scroll spins the globe (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-5, 0),
        MouseEventKind::ScrollRight => app.pan(5, 0),
        // Click and drag to rotate
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    layer: LabelLayer,
    home: Home,
    source: String,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize, layer, home, source);

    // Main loop; each iteration is one frame
    loop {
        // Label pass, only if the camera moved since the last one
        if let Some(summary) = app.tick() {
            tracing::trace!(?summary, "label pass");
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Rotate with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
