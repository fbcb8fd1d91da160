use std::{env, io, path::PathBuf, sync::Arc};

use log::{error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    signal,
};

use coordinator::{BridgeError, Coordinator, CoordinatorConfig, Reply, Request};
use model::LocalRuntime;
use tokenizer::WordIndex;
use transport::HttpTransport;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_WORK_DIR: &str = "work";

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let server_url = env::var("SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let tokenizer_path =
        PathBuf::from(env::var("TOKENIZER_PATH").unwrap_or_else(|_| "tokenizer.json".to_string()));
    let model_path = PathBuf::from(env::var("MODEL_PATH").unwrap_or_else(|_| "model.json".to_string()));
    let work_dir = PathBuf::from(env::var("WORK_DIR").unwrap_or_else(|_| DEFAULT_WORK_DIR.to_string()));

    // Missing resources degrade predict/train to INVALID_ARGUMENT instead
    // of stopping the process, matching launch-time behavior of the client.
    let word_index = match WordIndex::load(&tokenizer_path) {
        Ok(index) => Some(index),
        Err(e) => {
            error!("failed to load tokenizer: {e}");
            None
        }
    };

    if !model_path.exists() {
        warn!("no bundled model at {}, seeding a fresh one", model_path.display());
        if let Err(e) = LocalRuntime::write_fresh(&model_path) {
            error!("failed to seed model: {e}");
        }
    }

    let cfg = CoordinatorConfig {
        base_model_path: model_path.clone(),
        work_dir,
    };
    cfg.prepare()?;

    let runtime = Arc::new(LocalRuntime::new(model_path));
    let server = Arc::new(HttpTransport::new(server_url));
    let coord = Coordinator::new(runtime, server, word_index, cfg);
    coord.load_default_model();

    info!("bridge ready, reading requests from stdin");

    tokio::select! {
        ret = bridge_loop(&coord) => {
            ret?;
            info!("bridge input closed");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGINT");
        }
    }

    coord.drain_background().await;
    Ok(())
}

/// Reads one JSON request per line and writes one JSON reply per request.
async fn bridge_loop(coord: &Coordinator<HttpTransport>) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match parse_request(&line) {
            Ok(request) => coord.handle(request).await,
            Err(error) => Reply::Error { error },
        };

        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Any line that is not a recognized request answers INVALID_ARGUMENT, the
/// bridge's not-implemented response.
fn parse_request(line: &str) -> Result<Request, BridgeError> {
    serde_json::from_str::<Request>(line).map_err(|e| {
        warn!("unparseable request: {e}");
        BridgeError {
            code: "INVALID_ARGUMENT".to_string(),
            message: format!("malformed request: {e}"),
        }
    })
}
