use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::{
    config::GateConfig,
    logging::GateLogger,
    metrics::GateMetrics,
    session::{Session, SessionId},
    status::{PlaceholderResponder, Responder},
    telemetry::get_meter,
};

pub struct Kickstand {
    config: GateConfig,
    responder: Box<dyn Responder>,
    metrics: GateMetrics,
}

impl Kickstand {
    pub fn new(config: GateConfig) -> Kickstand {
        let responder = PlaceholderResponder::new(config.status.clone(), Some(config.icon.clone()));
        Self::with_responder(config, Box::new(responder))
    }

    pub fn with_responder(config: GateConfig, responder: Box<dyn Responder>) -> Kickstand {
        Kickstand {
            config,
            responder,
            metrics: GateMetrics::new(&get_meter()),
        }
    }

    pub async fn start(&'static self) -> anyhow::Result<()> {
        let address = self.config.bind_addr()?;
        GateLogger::preparing_socket(&address);

        let listener = TcpListener::bind(address).await?;
        GateLogger::listener_booted();

        self.serve(listener).await
    }

    /// Accepts until the listener fails. Each connection gets its own task,
    /// so a broken session never reaches this loop.
    pub async fn serve(&'static self, listener: TcpListener) -> anyhow::Result<()> {
        let mut next_id = 0u64;
        loop {
            let (client, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    GateLogger::accept_failed(&err);
                    return Err(err.into());
                }
            };

            if self.config.nodelay {
                if let Err(e) = client.set_nodelay(true) {
                    GateLogger::tcp_nodelay_failed(&e);
                }
            }

            next_id += 1;
            let id = SessionId(next_id);
            tokio::spawn(self.handle_connection(id, client, addr));
        }
    }

    pub async fn handle_connection(&self, id: SessionId, client: TcpStream, address: SocketAddr) {
        GateLogger::new_connection(id, &address);
        self.metrics.record_open();

        let session = Session::new(id, address, client, self.responder.as_ref(), &self.metrics)
            .with_idle_timeout(self.config.idle_timeout());

        match session.run().await {
            Ok(reason) => GateLogger::session_closed(id, reason.as_str()),
            Err(err) => {
                self.metrics.record_failure(err.kind());
                GateLogger::session_error(id, &address, &err);
                GateLogger::session_closed(id, err.kind());
            }
        }
    }
}
