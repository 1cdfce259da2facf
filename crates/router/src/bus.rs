use std::sync::Arc;
use std::time::Duration;

use cartkeep_core::config::RouterConfig;
use cartkeep_core::{Error, Request, Response};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::registry::CommandRouter;

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Sending half of the bus. Cheap to clone; one per calling context.
#[derive(Clone)]
pub struct CommandClient {
    tx: mpsc::Sender<Envelope>,
    response_timeout: Duration,
}

/// Receiving half, owned by the context that runs the [`CommandRouter`].
pub struct CommandBus {
    rx: mpsc::Receiver<Envelope>,
}

impl CommandBus {
    pub fn new(capacity: usize, response_timeout: Duration) -> (CommandClient, CommandBus) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            CommandClient {
                tx,
                response_timeout,
            },
            CommandBus { rx },
        )
    }

    pub fn from_config(config: &RouterConfig) -> (CommandClient, CommandBus) {
        Self::new(
            config.bus_capacity,
            Duration::from_secs(config.response_timeout_secs),
        )
    }

    /// Answer every envelope until all clients are gone. Each request runs on
    /// its own task.
    pub async fn serve(mut self, router: Arc<CommandRouter>) {
        while let Some(envelope) = self.rx.recv().await {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                let action = envelope.request.action.clone();
                let response = router.dispatch(envelope.request).await;
                if envelope.reply.send(response).is_err() {
                    debug!(action = %action, "Caller went away before the response");
                }
            });
        }
        debug!("Command bus closed");
    }
}

impl CommandClient {
    /// Send one request and wait for its response. Always yields a
    /// [`Response`]; a closed bus or a timeout becomes a failure.
    pub async fn send(&self, request: Request) -> Response {
        let action = request.action.clone();
        let (reply, response) = oneshot::channel();
        if self.tx.send(Envelope { request, reply }).await.is_err() {
            warn!(action = %action, "Command bus is closed");
            return Response::from(Error::Internal(
                "Could not establish connection. Receiving end does not exist.".to_string(),
            ));
        }

        match tokio::time::timeout(self.response_timeout, response).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                warn!(action = %action, "Command dropped without a response");
                Response::from(Error::Internal(format!(
                    "{} was dropped without a response",
                    action
                )))
            }
            Err(_) => {
                warn!(action = %action, timeout = ?self.response_timeout, "Command timed out");
                Response::from(Error::Timeout(format!(
                    "No response to {} within {}s",
                    action,
                    self.response_timeout.as_secs()
                )))
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
