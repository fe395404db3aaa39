//! `flowmeta`: aplica comandos JSON (uno por línea) contra el store de
//! metadatos y escribe una respuesta JSON por línea en stdout.
//!
//! Backend: Postgres si hay `DATABASE_URL` (salvo `--memory`), memoria en
//! otro caso. Los logs van a stderr.
//!
//! Ejemplo:
//! `echo '{"op":"create","entity":{"kind":"Schema","version":"v1","name":"Sch"}}' | flowmeta`

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use flowmeta_core::{Command, Failure, Reply, RequestContext};
use flowmeta_rust::{init_tracing, AppConfig, AppError, Backend, CONFIG};

#[derive(Debug, Parser)]
#[command(name = "flowmeta", version, about = "Store de metadatos de flows: comandos JSON-lines")]
struct Args {
    /// Archivo con un comando JSON por línea (por defecto stdin).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Actor que firma las mutaciones.
    #[arg(long, env = "FLOWMETA_ACTOR")]
    actor: Option<String>,

    /// Plazo por comando en milisegundos (0 = sin plazo).
    #[arg(long, env = "FLOWMETA_REQUEST_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Usa el backend en memoria aunque exista DATABASE_URL.
    #[arg(long)]
    memory: bool,

    /// Termina con código 1 si algún comando fue rechazado.
    #[arg(long)]
    strict: bool,
}

impl Args {
    fn config(&self) -> AppConfig {
        let mut cfg = CONFIG.clone();
        if let Some(actor) = &self.actor {
            cfg.actor = actor.clone();
        }
        if let Some(ms) = self.timeout_ms {
            cfg.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if self.memory {
            cfg.database = None;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let cfg = args.config();
    if let Err(e) = init_tracing(&cfg.log_filter) {
        eprintln!("[flowmeta] {e}");
    }
    match run(&args, &cfg).await {
        Ok(failures) if failures > 0 && args.strict => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("flowmeta aborted: {e}");
            eprintln!("[flowmeta] {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: &Args, cfg: &AppConfig) -> Result<usize, AppError> {
    let backend = Backend::from_config(cfg).await?;
    log::info!("backend={} actor={}", backend.name(), cfg.actor);
    match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await
                                                  .map_err(|e| AppError::Io(format!("{}: {e}", path.display())))?;
            process(&backend, cfg, BufReader::new(file)).await
        }
        None => process(&backend, cfg, BufReader::new(tokio::io::stdin())).await,
    }
}

/// Procesa línea a línea; devuelve cuántas respuestas fueron fallos.
async fn process<R>(backend: &Backend, cfg: &AppConfig, reader: R) -> Result<usize, AppError>
    where R: AsyncBufRead + Unpin
{
    let mut lines = reader.lines();
    let mut out = tokio::io::stdout();
    let mut failures = 0;
    while let Some(line) = lines.next_line().await.map_err(|e| AppError::Io(e.to_string()))? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let reply = match serde_json::from_str::<Command>(line) {
            Ok(command) => {
                let ctx: RequestContext = cfg.request_context();
                backend.handle(&ctx, command).await
            }
            Err(e) => Reply::Failure(Failure { error: format!("invalid command: {e}"),
                                               error_type: "InvalidCommand".into(),
                                               references: None }),
        };
        if reply.is_failure() {
            failures += 1;
        }
        let mut encoded = serde_json::to_string(&reply).map_err(|e| AppError::Io(e.to_string()))?;
        encoded.push('\n');
        out.write_all(encoded.as_bytes()).await.map_err(|e| AppError::Io(e.to_string()))?;
    }
    out.flush().await.map_err(|e| AppError::Io(e.to_string()))?;
    Ok(failures)
}
