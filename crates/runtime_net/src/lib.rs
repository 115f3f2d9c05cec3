use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use bus::{CoreCommand, CoreEvent};
use net::{Client, fetch_async};

/// Serves `Fetch` commands until `Shutdown` or until every command sender is
/// gone. Each fetch runs on its own thread, so completions arrive in the
/// order the responses do.
pub fn start_net_runtime(
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
    client: Client,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CoreCommand::Fetch {
                    request_id,
                    request,
                } => {
                    log::debug!(target: "runtime_net", "fetch #{request_id} {}", request.url);
                    let evt_tx = evt_tx.clone();
                    let url = request.url.clone();
                    fetch_async(
                        client.clone(),
                        request,
                        Arc::new(move |result| {
                            let evt = match result {
                                Ok(response) => CoreEvent::NetworkDone {
                                    request_id,
                                    response,
                                },
                                Err(error) => CoreEvent::NetworkError {
                                    request_id,
                                    url: url.clone(),
                                    error,
                                },
                            };
                            // receiver gone means the page was dropped
                            let _ = evt_tx.send(evt);
                        }),
                    );
                }
                CoreCommand::Shutdown => break,
            }
        }
        log::debug!(target: "runtime_net", "net runtime stopped");
    })
}
