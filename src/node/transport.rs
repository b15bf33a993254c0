use crate::error::{TfResult, TriadForgeError};
use crate::hive::transport::HiveEvent;
use crate::protocol::{self, HiveMessage, JobResult, WorkerId};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Worker side of the coordinator link.
pub trait NodeLink {
    /// Blocks until the coordinator sends something.
    fn recv(&mut self) -> TfResult<HiveMessage>;

    fn send_result(&mut self, result: &JobResult) -> TfResult<()>;
}

pub struct TcpNode {
    stream: TcpStream,
}

impl TcpNode {
    /// Connects to the coordinator, retrying while it is not up yet.
    pub fn connect<A: ToSocketAddrs + std::fmt::Display>(
        addr: A,
        attempts: usize,
        retry_delay: Duration,
    ) -> TfResult<Self> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            match TcpStream::connect(&addr) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    info!("🔌 Connected to hive at {}", addr);
                    return Ok(Self { stream });
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "Hive at {} unreachable ({}). Retrying in {:?}...",
                        addr, e, retry_delay
                    );
                    thread::sleep(retry_delay);
                }
                Err(e) => {
                    return Err(TriadForgeError::Transport(format!(
                        "could not reach hive at {}: {}",
                        addr, e
                    )))
                }
            }
        }
        Err(TriadForgeError::Transport(format!(
            "could not reach hive at {}",
            addr
        )))
    }
}

impl NodeLink for TcpNode {
    fn recv(&mut self) -> TfResult<HiveMessage> {
        protocol::recv_message(&mut self.stream)
    }

    fn send_result(&mut self, result: &JobResult) -> TfResult<()> {
        protocol::send_result(&mut self.stream, result)
    }
}

/// In-process link built by [`crate::hive::transport::local_cluster`].
/// Dropping it before a shutdown was received reports the worker as lost.
pub struct ChannelNode {
    worker_id: WorkerId,
    inbox: Receiver<HiveMessage>,
    outbox: Sender<HiveEvent>,
    shutdown_seen: bool,
}

impl ChannelNode {
    pub(crate) fn new(
        worker_id: WorkerId,
        inbox: Receiver<HiveMessage>,
        outbox: Sender<HiveEvent>,
    ) -> Self {
        Self {
            worker_id,
            inbox,
            outbox,
            shutdown_seen: false,
        }
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }
}

impl NodeLink for ChannelNode {
    fn recv(&mut self) -> TfResult<HiveMessage> {
        let msg = self
            .inbox
            .recv()
            .map_err(|_| TriadForgeError::Transport("coordinator hung up".to_string()))?;
        if msg == HiveMessage::Shutdown {
            self.shutdown_seen = true;
        }
        Ok(msg)
    }

    fn send_result(&mut self, result: &JobResult) -> TfResult<()> {
        self.outbox
            .send(HiveEvent::Result(result.clone()))
            .map_err(|_| TriadForgeError::Transport("coordinator hung up".to_string()))
    }
}

impl Drop for ChannelNode {
    fn drop(&mut self) {
        if !self.shutdown_seen {
            let _ = self.outbox.send(HiveEvent::Lost {
                worker_id: self.worker_id,
                reason: "worker exited before shutdown".to_string(),
            });
        }
    }
}
