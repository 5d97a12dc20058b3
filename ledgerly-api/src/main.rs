use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use extractors::{PdfExtractBackend, PdfTextExtractor};
use ledgerly_agents::{LlmClient, OpenAiCompatibleClient, StatementExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use ledgerly_api::config::ApiConfig;
use ledgerly_api::{configure, frontend_service, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("ledgerly-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (config, config_path) = ApiConfig::load(args.config).expect("Failed to load config");
    tracing::info!("Loaded config from {:?}", config_path);

    let llm_client: Arc<dyn LlmClient> = Arc::new(
        OpenAiCompatibleClient::new(config.llm.client_config())
            .expect("Failed to initialize LLM client (is an API key configured?)"),
    );
    let options = config.llm.extraction_options();
    tracing::info!("Using model {}", options.model);

    std::fs::create_dir_all(&config.storage.uploads_dir)?;
    std::fs::create_dir_all(&config.storage.downloads_dir)?;

    let pdf: Arc<dyn PdfTextExtractor> = Arc::new(PdfExtractBackend);
    let state = AppState {
        extractor: Arc::new(StatementExtractor::new(llm_client, options)),
        pdf,
        storage: config.storage.clone(),
    };

    let frontend_dir = config
        .frontend
        .as_ref()
        .map(|f| f.build_dir.clone())
        .filter(|dir| {
            let exists = dir.join("index.html").is_file();
            if !exists {
                tracing::warn!("Frontend build not found at {:?}, not serving it", dir);
            }
            exists
        });

    let host = config.server.host.clone();
    let port = config.server.port;
    tracing::info!("Server will listen on {}:{}", host, port);

    HttpServer::new(move || {
        let origins = config.cors.as_ref().filter(|c| !c.allowed_origins.is_empty());
        let cors = if let Some(cors_config) = origins {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        let storage = state.storage.clone();
        let mut app = App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure(cfg, &storage));

        // Registered last so API routes take precedence over the catch-all
        if let Some(dir) = &frontend_dir {
            app = app.service(frontend_service(dir));
        }
        app
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
