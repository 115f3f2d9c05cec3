use core_types::RequestId;
use net::{NetError, Request, Response};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug)]
pub enum CoreCommand {
    // Network requests
    Fetch {
        request_id: RequestId,
        request: Request,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum CoreEvent {
    // Network -> page
    NetworkDone {
        request_id: RequestId,
        response: Response,
    },
    NetworkError {
        request_id: RequestId,
        url: String,
        error: NetError,
    },
}

impl CoreEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            CoreEvent::NetworkDone { request_id, .. }
            | CoreEvent::NetworkError { request_id, .. } => *request_id,
        }
    }
}

pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// New bus plus the command receiver a runtime consumes.
    pub fn new() -> (Self, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        (
            Self {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}
