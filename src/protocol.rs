//! Coordinator/worker wire contract, version 1.
//!
//! Every message travels as a frame: a big-endian `u32` body length followed
//! by the body. A body starts with `u8 version` and `u8 kind`; all integers are
//! big-endian.
//!
//! | kind | message | payload                                             | body |
//! |------|---------|-----------------------------------------------------|------|
//! | 1    | SEED    | `u32 worker_id`, `u32 seed`                         | 10   |
//! | 2    | JOB     | `i32 iterations` (negative = shutdown)              | 6    |
//! | 3    | RESULT  | `u32 sender`, `f64 score`, 47 layout bytes + NUL     | 62   |

use crate::error::{TfResult, TriadForgeError};
use crate::geometry::NUM_KEYS;
use crate::layouts::Layout;
use std::io::{Read, Write};

pub const PROTOCOL_VERSION: u8 = 1;

/// Largest body either end will accept.
pub const MAX_FRAME_LEN: usize = 64;

pub const KIND_SEED: u8 = 1;
pub const KIND_JOB: u8 = 2;
pub const KIND_RESULT: u8 = 3;

const HEADER_LEN: usize = 2;
pub const SEED_LEN: usize = HEADER_LEN + 8;
pub const JOB_LEN: usize = HEADER_LEN + 4;
/// Layout field: 47 characters and a NUL terminator.
pub const LAYOUT_FIELD_LEN: usize = NUM_KEYS + 1;
pub const RESULT_LEN: usize = HEADER_LEN + 4 + 8 + LAYOUT_FIELD_LEN;

/// Value of the JOB field that tells a worker to stop.
pub const SHUTDOWN_SENTINEL: i32 = -1;

pub type WorkerId = u32;

/// Coordinator -> worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveMessage {
    Seed { worker_id: WorkerId, seed: u32 },
    Job { iterations: u32 },
    Shutdown,
}

impl HiveMessage {
    pub fn encode(&self) -> TfResult<Vec<u8>> {
        match *self {
            HiveMessage::Seed { worker_id, seed } => {
                let mut body = Vec::with_capacity(SEED_LEN);
                body.extend_from_slice(&[PROTOCOL_VERSION, KIND_SEED]);
                body.extend_from_slice(&worker_id.to_be_bytes());
                body.extend_from_slice(&seed.to_be_bytes());
                Ok(body)
            }
            HiveMessage::Job { iterations } => {
                let signed = i32::try_from(iterations).map_err(|_| {
                    TriadForgeError::Protocol(format!(
                        "job of {} iterations does not fit the i32 field",
                        iterations
                    ))
                })?;
                Ok(job_body(signed))
            }
            HiveMessage::Shutdown => Ok(job_body(SHUTDOWN_SENTINEL)),
        }
    }

    pub fn decode(body: &[u8]) -> TfResult<Self> {
        let kind = check_header(body)?;
        match kind {
            KIND_SEED => {
                expect_len(body, SEED_LEN, "SEED")?;
                Ok(HiveMessage::Seed {
                    worker_id: read_u32(&body[2..6]),
                    seed: read_u32(&body[6..10]),
                })
            }
            KIND_JOB => {
                expect_len(body, JOB_LEN, "JOB")?;
                let iterations = i32::from_be_bytes([body[2], body[3], body[4], body[5]]);
                if iterations < 0 {
                    Ok(HiveMessage::Shutdown)
                } else {
                    Ok(HiveMessage::Job {
                        iterations: iterations as u32,
                    })
                }
            }
            other => Err(TriadForgeError::Protocol(format!(
                "unexpected message kind {} from coordinator",
                other
            ))),
        }
    }
}

fn job_body(iterations: i32) -> Vec<u8> {
    let mut body = Vec::with_capacity(JOB_LEN);
    body.extend_from_slice(&[PROTOCOL_VERSION, KIND_JOB]);
    body.extend_from_slice(&iterations.to_be_bytes());
    body
}

/// Worker -> coordinator: the best layout one job found.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub worker_id: WorkerId,
    pub score: f64,
    pub layout: Layout,
}

impl JobResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(RESULT_LEN);
        body.extend_from_slice(&[PROTOCOL_VERSION, KIND_RESULT]);
        body.extend_from_slice(&self.worker_id.to_be_bytes());
        body.extend_from_slice(&self.score.to_bits().to_be_bytes());
        body.extend_from_slice(self.layout.as_bytes());
        body.push(0);
        body
    }

    pub fn decode(body: &[u8]) -> TfResult<Self> {
        let kind = check_header(body)?;
        if kind != KIND_RESULT {
            return Err(TriadForgeError::Protocol(format!(
                "unexpected message kind {} from worker",
                kind
            )));
        }
        expect_len(body, RESULT_LEN, "RESULT")?;

        let worker_id = read_u32(&body[2..6]);
        let mut bits = [0u8; 8];
        bits.copy_from_slice(&body[6..14]);
        let score = f64::from_bits(u64::from_be_bytes(bits));
        if !score.is_finite() {
            return Err(TriadForgeError::Protocol(format!(
                "result score {} is not finite",
                score
            )));
        }

        let field = &body[14..RESULT_LEN];
        if field[NUM_KEYS] != 0 {
            return Err(TriadForgeError::Protocol(
                "layout field is not NUL-terminated".to_string(),
            ));
        }
        let layout = Layout::from_bytes(&field[..NUM_KEYS])
            .map_err(|e| TriadForgeError::Protocol(format!("bad layout in result: {}", e)))?;

        Ok(JobResult {
            worker_id,
            score,
            layout,
        })
    }
}

fn check_header(body: &[u8]) -> TfResult<u8> {
    if body.len() < HEADER_LEN {
        return Err(TriadForgeError::Protocol(format!(
            "frame body of {} bytes is too short",
            body.len()
        )));
    }
    if body[0] != PROTOCOL_VERSION {
        return Err(TriadForgeError::Protocol(format!(
            "unsupported protocol version {} (expected {})",
            body[0], PROTOCOL_VERSION
        )));
    }
    Ok(body[1])
}

fn expect_len(body: &[u8], expected: usize, name: &str) -> TfResult<()> {
    if body.len() != expected {
        return Err(TriadForgeError::Protocol(format!(
            "{} body is {} bytes, expected {}",
            name,
            body.len(),
            expected
        )));
    }
    Ok(())
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Writes the length prefix and the body.
pub fn write_frame<W: Write>(sink: &mut W, body: &[u8]) -> TfResult<()> {
    if body.len() > MAX_FRAME_LEN {
        return Err(TriadForgeError::Protocol(format!(
            "frame body of {} bytes exceeds the {} byte limit",
            body.len(),
            MAX_FRAME_LEN
        )));
    }
    let len = body.len() as u32;
    sink.write_all(&len.to_be_bytes())?;
    sink.write_all(body)?;
    sink.flush()?;
    Ok(())
}

/// Reads the length prefix and then the body.
pub fn read_frame<R: Read>(src: &mut R) -> TfResult<Vec<u8>> {
    let mut size = [0u8; 4];
    src.read_exact(&mut size)?;
    let len = u32::from_be_bytes(size) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TriadForgeError::Protocol(format!(
            "incoming frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_LEN
        )));
    }
    let mut body = vec![0u8; len];
    src.read_exact(&mut body)?;
    Ok(body)
}

pub fn send_message<W: Write>(sink: &mut W, msg: &HiveMessage) -> TfResult<()> {
    write_frame(sink, &msg.encode()?)
}

pub fn recv_message<R: Read>(src: &mut R) -> TfResult<HiveMessage> {
    HiveMessage::decode(&read_frame(src)?)
}

pub fn send_result<W: Write>(sink: &mut W, result: &JobResult) -> TfResult<()> {
    write_frame(sink, &result.encode())
}

pub fn recv_result<R: Read>(src: &mut R) -> TfResult<JobResult> {
    JobResult::decode(&read_frame(src)?)
}
