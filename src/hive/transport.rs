use crate::error::{TfResult, TriadForgeError};
use crate::node::transport::ChannelNode;
use crate::protocol::{self, HiveMessage, JobResult, WorkerId};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the coordinator hears from its workers.
#[derive(Debug, Clone, PartialEq)]
pub enum HiveEvent {
    Result(JobResult),
    /// The worker's connection is gone; no more results will come from it.
    Lost { worker_id: WorkerId, reason: String },
}

/// Coordinator side of the worker links.
pub trait HiveTransport {
    fn workers(&self) -> Vec<WorkerId>;

    fn send(&mut self, worker: WorkerId, msg: &HiveMessage) -> TfResult<()>;

    /// Blocks for at most `timeout`. `Ok(None)` means nothing arrived in time.
    fn recv_timeout(&mut self, timeout: Duration) -> TfResult<Option<HiveEvent>>;
}

/// Workers connected over TCP. Each connection gets a reader thread that
/// feeds results into one channel, so the coordinator can wait on all of
/// them at once.
pub struct TcpHive {
    writers: BTreeMap<WorkerId, TcpStream>,
    events: Receiver<HiveEvent>,
}

impl TcpHive {
    /// Accepts up to `count` workers, numbering them from 1. Gives up waiting
    /// after `accept_timeout`; fails only if nobody connected at all.
    pub fn accept(listener: &TcpListener, count: usize, accept_timeout: Duration) -> TfResult<Self> {
        let (tx, events) = mpsc::channel();
        let mut writers = BTreeMap::new();
        let deadline = Instant::now() + accept_timeout;

        listener.set_nonblocking(true)?;
        while writers.len() < count {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let worker_id = writers.len() as WorkerId + 1;
                    stream.set_nonblocking(false)?;
                    stream.set_nodelay(true)?;
                    let reader = stream.try_clone()?;
                    spawn_reader(worker_id, reader, tx.clone());
                    info!("🤝 Worker {} connected from {}", worker_id, peer);
                    writers.insert(worker_id, stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    listener.set_nonblocking(false)?;
                    return Err(TriadForgeError::Transport(format!("accept failed: {}", e)));
                }
            }
        }
        listener.set_nonblocking(false)?;

        if writers.is_empty() {
            return Err(TriadForgeError::Transport(format!(
                "no workers connected within {:?}",
                accept_timeout
            )));
        }
        if writers.len() < count {
            warn!(
                "⚠️  Only {} of {} workers connected; continuing with those.",
                writers.len(),
                count
            );
        }

        Ok(Self { writers, events })
    }
}

fn spawn_reader(worker_id: WorkerId, mut stream: TcpStream, tx: Sender<HiveEvent>) {
    thread::spawn(move || loop {
        match protocol::recv_result(&mut stream) {
            Ok(mut result) => {
                if result.worker_id != worker_id {
                    debug!(
                        "worker {} reported sender id {}; using the connection id",
                        worker_id, result.worker_id
                    );
                    result.worker_id = worker_id;
                }
                if tx.send(HiveEvent::Result(result)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(HiveEvent::Lost {
                    worker_id,
                    reason: e.to_string(),
                });
                break;
            }
        }
    });
}

impl HiveTransport for TcpHive {
    fn workers(&self) -> Vec<WorkerId> {
        self.writers.keys().copied().collect()
    }

    fn send(&mut self, worker: WorkerId, msg: &HiveMessage) -> TfResult<()> {
        let stream = self.writers.get_mut(&worker).ok_or_else(|| {
            TriadForgeError::Transport(format!("unknown worker {}", worker))
        })?;
        protocol::send_message(stream, msg)
    }

    fn recv_timeout(&mut self, timeout: Duration) -> TfResult<Option<HiveEvent>> {
        recv_event(&self.events, timeout)
    }
}

impl Drop for TcpHive {
    fn drop(&mut self) {
        // Unblocks the reader threads.
        for stream in self.writers.values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

fn recv_event(events: &Receiver<HiveEvent>, timeout: Duration) -> TfResult<Option<HiveEvent>> {
    match events.recv_timeout(timeout) {
        Ok(event) => Ok(Some(event)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(TriadForgeError::Transport(
            "every worker link has closed".to_string(),
        )),
    }
}

/// In-process workers linked by channels (worker threads in one process).
pub struct ChannelHive {
    outboxes: BTreeMap<WorkerId, Sender<HiveMessage>>,
    events: Receiver<HiveEvent>,
}

/// Builds a coordinator link and `count` worker links, ids starting at 1.
pub fn local_cluster(count: usize) -> (ChannelHive, Vec<ChannelNode>) {
    let (event_tx, events) = mpsc::channel();
    let mut outboxes = BTreeMap::new();
    let mut nodes = Vec::with_capacity(count);

    for i in 0..count {
        let worker_id = i as WorkerId + 1;
        let (tx, inbox) = mpsc::channel();
        outboxes.insert(worker_id, tx);
        nodes.push(ChannelNode::new(worker_id, inbox, event_tx.clone()));
    }

    (ChannelHive { outboxes, events }, nodes)
}

impl HiveTransport for ChannelHive {
    fn workers(&self) -> Vec<WorkerId> {
        self.outboxes.keys().copied().collect()
    }

    fn send(&mut self, worker: WorkerId, msg: &HiveMessage) -> TfResult<()> {
        let outbox = self.outboxes.get(&worker).ok_or_else(|| {
            TriadForgeError::Transport(format!("unknown worker {}", worker))
        })?;
        outbox
            .send(*msg)
            .map_err(|_| TriadForgeError::Transport(format!("worker {} has gone away", worker)))
    }

    fn recv_timeout(&mut self, timeout: Duration) -> TfResult<Option<HiveEvent>> {
        recv_event(&self.events, timeout)
    }
}
