use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};
use serde::Deserialize;

use rnn_gen_core::config::{DEFAULT_SEED, GenerationConfig};
use rnn_gen_core::pipeline::TrainedModel;
use rnn_gen_core::text::normalizer::normalize;
use rnn_gen_core::Error;

#[derive(Parser, Debug)]
#[command(name = "rnn-gen-server", about = "Serve text generation from a trained character model")]
struct Args {
	/// Directory holding model.bin and bundle.json
	#[arg(long, default_value = "./model")]
	model_dir: PathBuf,

	#[arg(long, default_value = "127.0.0.1")]
	bind: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	seed: Option<String>,
	seed_offset: Option<usize>,
	length: Option<usize>,
	temperature: Option<f32>,
	rng_seed: Option<u64>,
}

impl GenerateParams {
	/// Builds the generation settings; the seed is cleaned like the corpus.
	fn config(&self) -> GenerationConfig {
		let defaults = GenerationConfig::default();
		GenerationConfig {
			seed: normalize(self.seed.as_deref().unwrap_or(DEFAULT_SEED)),
			seed_offset: self.seed_offset.unwrap_or(defaults.seed_offset),
			sample_count: self.length.unwrap_or(defaults.sample_count),
			temperature: self.temperature.unwrap_or(defaults.temperature),
			rng_seed: self.rng_seed,
		}
	}
}

struct SharedData {
	model_dir: PathBuf,
	model: TrainedModel,
}

/// Maps a library error to a response: caller mistakes are 400, the rest 500.
fn error_response(e: &Error) -> HttpResponse {
	if e.is_input() {
		HttpResponse::BadRequest().body(e.to_string())
	} else {
		error!("{e}");
		HttpResponse::InternalServerError().body(e.to_string())
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Runs the generation loop with the query parameters and returns the
/// generated characters (seed excluded) as the response body.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let config = query.config();

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.generate(&config) {
		Ok(generated) => HttpResponse::Ok().body(generated.text),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/bundle`: the bundle of the loaded model as JSON.
#[get("/v1/bundle")]
async fn get_bundle(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(shared_data.model.bundle())
}

/// HTTP PUT endpoint `/v1/reload`: reads the model directory again.
///
/// The current model stays in place if loading fails.
#[put("/v1/reload")]
async fn put_reload(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match TrainedModel::load(&shared_data.model_dir) {
		Ok(model) => {
			shared_data.model = model;
			info!("Reloaded model from {}", shared_data.model_dir.display());
			HttpResponse::Ok().body("Model reloaded successfully")
		}
		Err(e) => error_response(&e),
	}
}

/// Main entry point for the server.
///
/// Loads the model directory, wraps it in a `Mutex`, and starts an
/// Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let model = TrainedModel::load(&args.model_dir).map_err(std::io::Error::other)?;
	let shared_data = SharedData {
		model_dir: args.model_dir,
		model,
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("Listening on {}:{}", args.bind, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_bundle)
			.service(put_reload)
	})
		.bind((args.bind.as_str(), args.port))?
		.run()
		.await
}
