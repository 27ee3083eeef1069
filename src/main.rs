use std::env;
use std::process;
use std::sync::Arc;

use run2style::config::{parse_flag, Config};
use run2style::engine::{Engine, PickerView, WaypointSequence};
use run2style::entities::Coordinates;
use run2style::error::{invalid_input_error, Error};
use run2style::headless::{HeadlessDocument, HeadlessRuntime};

const USAGE: &str = "usage: run2style <lat> <lng> [keyword ...]";

fn parse_args(args: &[String]) -> Result<(Coordinates, Vec<String>), Error> {
    let lat: f64 = args
        .get(0)
        .and_then(|v| v.parse().ok())
        .ok_or_else(invalid_input_error)?;
    let lng: f64 = args
        .get(1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(invalid_input_error)?;

    Ok((Coordinates::from((lat, lng)), args[2..].to_vec()))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (start, keywords) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{}: {}", err, USAGE);
            process::exit(2);
        }
    };

    let config = Config::from_env();
    let runtime = Arc::new(HeadlessRuntime::new());
    let engine = Engine::new(&config, Arc::new(HeadlessDocument::new()), runtime.clone());

    let mut form = engine.form();

    if let PickerView::Failed { reason } = form.map_ready().await {
        eprintln!("{}", reason);
        process::exit(1);
    }

    if let Some(map) = runtime.last_map() {
        map.click(start);
    }

    if let Some(km) = env::var("RUN_DISTANCE_KM").ok().and_then(|v| v.parse().ok()) {
        form.set_total_distance_km(km);
    }
    if env::var("RUN_ONE_WAY").map_or(false, |v| parse_flag(&v)) {
        form.set_round_trip(false);
    }
    if !keywords.is_empty() {
        *form.waypoints_mut() = WaypointSequence::from_keywords(keywords);
    }

    if !form.can_submit() {
        eprintln!("nothing to submit: pick a start, a positive distance and at least one keyword");
        process::exit(2);
    }

    tracing::info!("{}", form.picker().view().caption());

    form.submit().await;

    match form.submission().error() {
        Some(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
        None => {
            if let Some(outcome) = form.outcome() {
                println!("{}", outcome);
            }
        }
    }
}
