use argh::FromArgs;
use arm_predict::{
    ArtifactStore, DiffFeatureExtractor, LogisticRunner, PredictionOrchestrator,
    server::{self, DEFAULT_MAX_UPLOAD_BYTES, RouterConfig, cors::resolve_cors_origins},
};
use std::{path::PathBuf, sync::Arc};

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";

#[derive(FromArgs)]
/// Serves before/after limb predictions over HTTP.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// directory where uploaded images are stored
    #[argh(option, short = 'u', default = "PathBuf::from(DEFAULT_UPLOAD_DIR)")]
    upload_dir: PathBuf,

    /// path to a JSON logistic model (built-in weights when omitted)
    #[argh(option, short = 'm')]
    model: Option<PathBuf>,

    /// maximum request body size in bytes
    #[argh(option, default = "DEFAULT_MAX_UPLOAD_BYTES")]
    max_upload_bytes: usize,

    /// comma-separated origins allowed by CORS (falls back to CORS_ORIGINS,
    /// FRONTEND_ORIGIN, FRONTEND_URL, then http://localhost:5173)
    #[argh(option)]
    cors_origins: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let runner = match &args.model {
        Some(path) => {
            log::info!("Loading model from {}", path.display());
            LogisticRunner::from_path(path)?
        }
        None => {
            log::info!("Using built-in model weights");
            LogisticRunner::default()
        }
    };

    let store = ArtifactStore::new(&args.upload_dir);
    std::fs::create_dir_all(store.root())?;
    log::info!("Storing uploads in {}", store.root().display());

    let orchestrator = Arc::new(PredictionOrchestrator::new(
        store,
        DiffFeatureExtractor::new(),
        runner,
    ));

    let config = RouterConfig {
        max_upload_bytes: args.max_upload_bytes,
        cors_origins: resolve_cors_origins(args.cors_origins.as_deref(), |key| {
            std::env::var(key).ok()
        }),
    };
    log::info!("Allowing CORS origins: {}", config.cors_origins.join(", "));
    let app = server::router(orchestrator, &config);

    log::info!("Starting the server");
    log::info!("Listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
