use chrono::Utc;
use clap::Parser;
use geolearn::assistant::{Assistant, GeminiClient};
use geolearn::config::{GeminiSettings, Settings};
use geolearn::dataset::{DatasetLoader, Facility, UreqFetcher};
use geolearn::favorites::FavoritesStore;
use geolearn::layers::{self, Layer, LayerQuery};
use geolearn::proximity::ProximityFinder;
use geolearn::search::{self, QuickSearch};
use geolearn::server::{self, AppState, SessionRegistry};
use geolearn::stats::IslandStats;
use geolearn::logging;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// GeoLearn: discover Tenerife's educational and cultural facilities.
///
/// Loads the island's open-data catalog and answers searches, layer
/// browsing, transit proximity and free-text questions.
///
/// Examples:
///   geolearn biblioteca
///   geolearn --ask "¿Dónde hay museos en La Laguna?"
///   geolearn --layer museos
///   geolearn --layer otros --activity "Museos Salas de Arte"
///   geolearn --nearby "Biblioteca Municipal Central"
///   geolearn --fav-add "Teatro Leal"
///   geolearn --serve --port 3000
#[derive(Parser)]
#[command(name = "geolearn", version, about, long_about = None)]
struct Cli {
    /// Map search query (positional). Example: geolearn biblioteca
    #[arg(index = 1)]
    query: Option<String>,

    /// Ask the assistant a free-text question.
    #[arg(long)]
    ask: Option<String>,

    /// Show one layer: otros, museos, teatros, bibliotecas, cultural, favoritos, todos.
    #[arg(long, value_parser = parse_layer)]
    layer: Option<Layer>,

    /// Exact activity type; overrides the layer rules.
    #[arg(long)]
    activity: Option<String>,

    /// Nearest tram and bus stops to the named facility.
    #[arg(long)]
    nearby: Option<String>,

    /// Add a facility name to favorites.
    #[arg(long)]
    fav_add: Option<String>,

    /// Remove a facility name from favorites.
    #[arg(long)]
    fav_remove: Option<String>,

    /// List favorites.
    #[arg(long)]
    favorites: bool,

    /// Facility counts by class.
    #[arg(long)]
    stats: bool,

    /// Start the HTTP API server.
    #[arg(long)]
    serve: bool,

    /// Server bind address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Settings file (TOML). Defaults to ./geolearn.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Never call the language model; keyword and reply fallbacks only.
    #[arg(long)]
    offline: bool,

    /// Debug logging for this crate.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_layer(s: &str) -> Result<Layer, String> {
    s.parse()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut favorites = match &settings.favorites_path {
        Some(path) => FavoritesStore::load_from(path.clone()),
        None => FavoritesStore::load(),
    };

    // ── Favorites (no dataset needed) ───────────────────────────

    if let Some(ref name) = cli.fav_add {
        if !favorites.add(name) {
            eprintln!("  '{}' is already a favorite", name.trim());
        }
        print_json(&favorites.names());
        return;
    }
    if let Some(ref name) = cli.fav_remove {
        if !favorites.remove(name) {
            eprintln!("  '{}' is not a favorite", name.trim());
        }
        print_json(&favorites.names());
        return;
    }
    if cli.favorites {
        print_json(&favorites.names());
        return;
    }

    // ── Load the catalog once ───────────────────────────────────

    let loader = DatasetLoader::new(
        settings.catalog_url.clone(),
        Arc::new(UreqFetcher::new(settings.http_timeout())),
    );
    let facilities: Arc<[Facility]> = loader.load_facilities(&settings.facilities_dataset).await.into();
    if facilities.is_empty() {
        eprintln!("  \u{26A0}\u{FE0F}  No facilities loaded; results will be empty.");
    } else {
        eprintln!("  {} facilities loaded", facilities.len());
    }

    let proximity = ProximityFinder::new(loader, settings.tram_dataset.clone(), settings.bus_dataset.clone());
    let assistant = Arc::new(build_assistant(&settings, cli.offline));

    if cli.serve {
        let state = Arc::new(AppState {
            facilities,
            loaded_at: Utc::now(),
            favorites: Mutex::new(favorites),
            proximity,
            assistant,
            sessions: SessionRegistry::new(),
        });
        server::start(&cli.host, cli.port, state).await;
        return;
    }

    if cli.stats {
        print_json(&IslandStats::compute(&facilities));
        return;
    }

    if let Some(ref question) = cli.ask {
        let answer = assistant.answer(&facilities, question).await;
        eprintln!("\n{}\n", answer.reply);
        print_json(&answer);
        return;
    }

    if let Some(ref name) = cli.nearby {
        let needle = name.trim().to_lowercase();
        let Some(facility) = facilities.iter().find(|f| f.name.trim().to_lowercase() == needle) else {
            eprintln!("Error: Facility not found: '{}'", name);
            std::process::exit(1);
        };
        let stops = proximity.nearest_stops(facility.coordinate()).await;
        for stop in &stops {
            eprintln!("  {:<5} {:<40} {:.2} km", stop.kind, stop.name, stop.distance_km);
        }
        print_json(&stops);
        return;
    }

    if cli.layer.is_some() || cli.activity.is_some() {
        let mut query = LayerQuery::layer(cli.layer.unwrap_or(Layer::Other));
        if let Some(ref activity) = cli.activity {
            query = query.with_override(activity.clone());
        }
        let visible = layers::filter(&query, &facilities, favorites.names());
        eprintln!("  {}: {} facilities", query.layer.label(), visible.len());
        print_json(&visible);
        return;
    }

    if let Some(ref q) = cli.query {
        let result = search::quick_search(&facilities, q);
        if let QuickSearch::NotFound { ref query } = result {
            eprintln!("  No results for '{}'", query);
        }
        print_json(&result);
        return;
    }

    eprintln!("Error: Nothing to do.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  geolearn biblioteca");
    eprintln!("  geolearn --ask \"¿Qué museos hay en Santa Cruz?\"");
    eprintln!("  geolearn --layer museos");
    eprintln!("  geolearn --nearby \"Teatro Leal\"");
    eprintln!("  geolearn --favorites");
    eprintln!("  geolearn --serve");
    std::process::exit(1);
}

fn build_assistant(settings: &Settings, offline: bool) -> Assistant {
    let gemini_settings = if offline {
        GeminiSettings { api_key: None, ..settings.gemini.clone() }
    } else {
        settings.gemini.clone()
    };
    let client = Arc::new(GeminiClient::new(&gemini_settings, settings.capability_timeout()));
    if !client.is_configured() {
        eprintln!("  Assistant running without a language model (set GEMINI_API_KEY to enable).");
    }
    Assistant::new(client.clone(), client).with_stage_timeout(settings.capability_timeout())
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
