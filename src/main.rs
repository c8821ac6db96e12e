#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use edistribucion_rs::api;
use edistribucion_rs::model::Api;
use rocket::{Build, Rocket, State};
use std::sync::Mutex;
use std::time::{Duration, Instant};

mod metrics;

const BASE_URL: &str = "https://zonaprivada.edistribucion.com";

#[derive(Clone, serde::Deserialize)]
pub struct EdistribucionConfig {
    base_url: String,
    username: String,
    password: String,
    interval: u64,
    timeout: u64,
}

/// Portal session settings plus the pacing of `/metrics` collections.
pub struct Exporter {
    api: Api,
    /// Minimum time between two portal collections; scrapes in between serve the registry as is.
    interval: Duration,
    last_collection: Mutex<Option<Instant>>,
}

impl Exporter {
    fn new(settings: EdistribucionConfig) -> Self {
        let mut api = api::api(settings.base_url, settings.username, settings.password);
        api.timeout = Duration::from_secs(settings.timeout);

        Exporter {
            api,
            interval: Duration::from_secs(settings.interval),
            last_collection: Mutex::new(None),
        }
    }

    fn mark_collected(&self) {
        match self.last_collection.lock() {
            Ok(mut last) => *last = Some(Instant::now()),
            Err(_) => log::trace!("Collection timestamp poisoned; next scrape collects again"),
        }
    }

    /// Whether the portal should be read again: never read yet, or `interval` has passed.
    fn collection_due(&self) -> bool {
        match self.last_collection.lock() {
            Ok(last) => last.map_or(true, |at| at.elapsed() >= self.interval),
            Err(_) => true,
        }
    }
}

/// Settings from `EDIS_*` environment variables.
pub fn read_settings() -> Result<EdistribucionConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("EDIS"))?
        .set_default("base_url", BASE_URL)?
        .set_default("interval", 300i64)?
        .set_default("timeout", 90i64)?;

    settings.try_into()
}

#[get("/metrics")]
async fn metrics_route(exporter: &State<Exporter>) -> Result<String, api::Error> {
    if exporter.collection_due() {
        metrics::collect(&exporter.api).await?;
        exporter.mark_collected();
    } else {
        log::info!("Last collection is recent; serving cached readings")
    }
    metrics::read().await
}

#[get("/dump-cups")]
async fn dump_cups_route(exporter: &State<Exporter>) -> Result<String, api::Error> {
    let logged_in_api = api::login(&exporter.api).await?;
    let readings = metrics::readings(&logged_in_api).await?;

    Ok(format!("{:#?}", readings))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    log::info!(
        "Exporting {} every {}s (request timeout {}s)",
        settings.base_url,
        settings.interval,
        settings.timeout
    );

    rocket::build()
        .manage(Exporter::new(settings))
        .mount("/", routes![metrics_route, dump_cups_route])
}
