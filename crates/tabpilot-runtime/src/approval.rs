//! Approval gate implementations.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use tabpilot_protocols::approval::{ApprovalGate, ApprovalRequest};

/// Approves everything immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn request_approval(&self, _request: &ApprovalRequest) -> bool {
        true
    }
}

/// Bounds another gate's wait. A timeout counts as a decline.
pub struct TimeoutGate<G> {
    inner: G,
    timeout: Duration,
}

impl<G> TimeoutGate<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<G: ApprovalGate> ApprovalGate for TimeoutGate<G> {
    async fn request_approval(&self, request: &ApprovalRequest) -> bool {
        match tokio::time::timeout(self.timeout, self.inner.request_approval(request)).await {
            Ok(approved) => approved,
            Err(_) => {
                warn!(
                    "Approval {} timed out after {:?}, declining",
                    request.id, self.timeout
                );
                false
            }
        }
    }
}

/// Asks on a line-oriented terminal, e.g. stdin/stdout.
pub struct PromptApprovalGate<R, W> {
    io: Mutex<(R, W)>,
}

impl<R, W> PromptApprovalGate<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

/// `y` or `yes`, case-insensitive. Everything else declines.
pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl<R, W> ApprovalGate for PromptApprovalGate<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request_approval(&self, request: &ApprovalRequest) -> bool {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        let prompt = format!(
            "The assistant wants to run:\n{}\nRun these actions? [y/N] ",
            request.describe()
        );
        if let Err(e) = writer.write_all(prompt.as_bytes()).await {
            warn!("Failed to write approval prompt: {}", e);
            return false;
        }
        let _ = writer.flush().await;

        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Approval input closed, declining");
                false
            }
            Ok(_) => {
                let approved = parse_answer(&line);
                info!("Approval {} answered: {}", request.id, approved);
                approved
            }
            Err(e) => {
                warn!("Failed to read approval answer: {}", e);
                false
            }
        }
    }
}

/// An approval request handed to another task, with its reply slot.
pub struct PendingApproval {
    pub request: ApprovalRequest,
    pub reply: oneshot::Sender<bool>,
}

/// Forwards requests over a channel to whoever renders them.
pub struct ChannelApprovalGate {
    tx: mpsc::Sender<PendingApproval>,
}

impl ChannelApprovalGate {
    pub fn new(tx: mpsc::Sender<PendingApproval>) -> Self {
        Self { tx }
    }

    /// Gate plus the receiving end for the UI side.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PendingApproval>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ApprovalGate for ChannelApprovalGate {
    async fn request_approval(&self, request: &ApprovalRequest) -> bool {
        let (reply, rx) = oneshot::channel();
        let pending = PendingApproval {
            request: request.clone(),
            reply,
        };
        if self.tx.send(pending).await.is_err() {
            warn!("Approval receiver is gone, declining {}", request.id);
            return false;
        }
        rx.await.unwrap_or(false)
    }
}
