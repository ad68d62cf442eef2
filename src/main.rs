use std::{env, error::Error, path::PathBuf};

use anyhow::Context;
use kickstand::{Kickstand, config::GateConfig, telemetry::init_meter, utils::leak};

struct Args {
    port: Option<u16>,
    config: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut port = None;
    let mut config = env::current_dir()?.join("settings.toml");

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" | "-port" => {
                let value = args.next().context("--port requires a value")?;
                port = Some(value.parse().context("--port expects 0-65535")?);
            }
            "--config" => {
                let value = args.next().context("--config requires a value")?;
                config = PathBuf::from(value);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => return Err(anyhow::anyhow!("unknown arg: {other}")),
        }
    }

    Ok(Args { port, config })
}

fn print_help() {
    println!("kickstand options:");
    println!("  --port <port>      listen port (overrides `bind`)");
    println!("  --config <path>    settings file (default ./settings.toml)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    #[cfg(debug_assertions)]
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let args = parse_args()?;

    let provider = if dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        Some(init_meter()?)
    } else {
        None
    };

    let mut config = GateConfig::load_or_init(&args.config)?;
    if let Some(port) = args.port {
        config.set_port(port)?;
    }

    let kickstand = leak(Kickstand::new(config));
    let outcome = {
        use futures::future::{FutureExt, select_all};
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let sigint_fut = sigint.recv().boxed();
        let sigterm_fut = sigterm.recv().boxed();

        tokio::select! {
            result = kickstand.start() => {
                if let Err(e) = &result {
                    log::error!("{e}");
                }
                result
            }
            _ = select_all([sigint_fut, sigterm_fut]) => {
                log::info!("Received signal, stopping...");
                Ok(())
            }
        }
    };

    if let Some(provider) = provider {
        provider.shutdown()?;
    }
    Ok(outcome?)
}
