//! The publish/subscribe message bus (§4.4).
//!
//! Grounded on `message_bus.py`'s `MessageBus`: subscribers register under a
//! unique id, `publish` fans a message out to every other registered
//! participant, and the bus keeps per-type send counters plus an optional
//! recording log. The concurrency shape is an enrichment — the teacher has
//! no async runtime, so the fan-out task and its `tokio::sync::mpsc` channel
//! are adopted from the wider example pack (see `DESIGN.md`) to satisfy the
//! requirement that fan-out run independently of the producing tick.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use sar_core::{DroneId, MessageId};
use sar_proto::{Message, MessagePayload};
use tokio::sync::{mpsc, oneshot};

use crate::stats::MessageStats;
use crate::{BusError, BusResult};

/// Observer ring buffer capacity (§5: "the Bus's `on_message_callback`
/// observer ring buffer holds at most 200 entries").
const RECENT_CAPACITY: usize = 200;

enum FanoutCommand {
    Publish(Message),
    /// Round-trips through the fan-out task so the caller can be sure every
    /// message published before the barrier has been delivered.
    Barrier(oneshot::Sender<()>),
}

struct SharedState {
    participants: BTreeSet<DroneId>,
    inboxes: HashMap<DroneId, VecDeque<Message>>,
    stats: MessageStats,
    recording: bool,
    message_log: Vec<Message>,
    recent: VecDeque<Message>,
}

impl SharedState {
    fn new() -> Self {
        SharedState {
            participants: BTreeSet::new(),
            inboxes: HashMap::new(),
            stats: MessageStats::default(),
            recording: false,
            message_log: Vec::new(),
            recent: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }

    fn deliver(&mut self, message: Message) {
        self.stats.record_sent(message.kind());
        self.stats.record_received();

        for &recipient in &self.participants {
            if recipient != message.sender_id {
                self.inboxes
                    .entry(recipient)
                    .or_default()
                    .push_back(message.clone());
            }
        }

        if self.recording {
            self.message_log.push(message.clone());
        }

        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }
}

/// Agent-to-agent publish/subscribe message bus.
///
/// `Bus` is the only component in this workspace that spawns a background
/// task: fan-out happens on a dedicated `tokio` task so that publishing
/// never blocks the tick that produced the message. Callers that need to be
/// sure a batch of publications has been fully delivered (the driver, once
/// per tick) call [`Bus::barrier`].
pub struct Bus {
    state: Arc<Mutex<SharedState>>,
    sender: mpsc::UnboundedSender<FanoutCommand>,
    fanout_task: Option<tokio::task::JoinHandle<()>>,
    next_id: AtomicU64,
}

impl Bus {
    /// Spawn a new bus and its fan-out task onto the current Tokio runtime.
    pub fn spawn() -> Self {
        let state = Arc::new(Mutex::new(SharedState::new()));
        let (sender, mut receiver) = mpsc::unbounded_channel::<FanoutCommand>();

        let task_state = Arc::clone(&state);
        let fanout_task = tokio::spawn(async move {
            while let Some(cmd) = receiver.recv().await {
                match cmd {
                    FanoutCommand::Publish(message) => {
                        let mut state = task_state.lock().unwrap();
                        state.deliver(message);
                    }
                    FanoutCommand::Barrier(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Bus {
            state,
            sender,
            fanout_task: Some(fanout_task),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a participant. Idempotent.
    pub fn register(&self, id: DroneId) {
        self.state.lock().unwrap().participants.insert(id);
    }

    pub fn unregister(&self, id: DroneId) {
        let mut state = self.state.lock().unwrap();
        state.participants.remove(&id);
        state.inboxes.remove(&id);
    }

    /// Issue the next globally unique message id for this run.
    pub fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Enqueue `message` for fan-out. Does not block on delivery — call
    /// [`Bus::barrier`] to wait for all queued publications to land.
    pub fn publish(&self, message: Message) -> BusResult<()> {
        self.sender
            .send(FanoutCommand::Publish(message))
            .map_err(|_| BusError::Closed)
    }

    /// Build and publish a message from sender + payload in one step,
    /// assigning the next message id and a timestamp.
    pub fn publish_from(
        &self,
        sender_id: DroneId,
        timestamp: sar_core::SimTime,
        payload: MessagePayload,
    ) -> BusResult<MessageId> {
        let id = self.next_message_id();
        self.publish(Message {
            id,
            sender_id,
            timestamp,
            payload,
        })?;
        Ok(id)
    }

    /// Wait until every message published before this call has been
    /// delivered to recipient inboxes. The driver calls this once per tick,
    /// after collecting all of that tick's outgoing messages, before the
    /// next tick drains inboxes.
    pub async fn barrier(&self) -> BusResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.sender
            .send(FanoutCommand::Barrier(ack_tx))
            .map_err(|_| BusError::Closed)?;
        ack_rx.await.map_err(|_| BusError::Closed)
    }

    /// Drain and return this participant's pending inbox, in FIFO order.
    pub fn take_inbox(&self, id: DroneId) -> Vec<Message> {
        let mut state = self.state.lock().unwrap();
        state
            .inboxes
            .get_mut(&id)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> MessageStats {
        self.state.lock().unwrap().stats.clone()
    }

    pub fn start_recording(&self) {
        let mut state = self.state.lock().unwrap();
        state.recording = true;
        state.message_log.clear();
    }

    pub fn stop_recording(&self) {
        self.state.lock().unwrap().recording = false;
    }

    pub fn message_log(&self) -> Vec<Message> {
        self.state.lock().unwrap().message_log.clone()
    }

    /// Up to the last 200 delivered messages, oldest first.
    pub fn recent_messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().recent.iter().cloned().collect()
    }

    /// Stop the fan-out task, awaiting any in-flight delivery. Idempotent —
    /// calling `stop` twice is a no-op on the second call.
    pub async fn stop(&mut self) {
        if let Some(task) = self.fanout_task.take() {
            drop(self.sender.clone());
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        if let Some(task) = self.fanout_task.take() {
            task.abort();
        }
    }
}
