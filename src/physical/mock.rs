use super::FrameTransport;
use crate::error::{DiagError, Result};
use crate::timer::{Clock, ManualClock};
use crate::types::{CanId, Frame, FrameFlags};
use std::collections::VecDeque;
use std::time::Duration;

/// Peer behaviour: called for every frame sent on the bus, returns the frames
/// the peer answers with.
pub type MockResponder = Box<dyn FnMut(&Frame) -> Vec<Frame> + Send>;

/// In-memory bus for tests.
///
/// Received frames can be scheduled for a point in simulated time, so a test
/// can describe a peer that answers late, or several times.
pub struct MockBus {
    clock: ManualClock,
    rx_queue: VecDeque<(Duration, Frame)>,
    sent: Vec<Frame>,
    responder: Option<MockResponder>,
    reply_delay: Duration,
    fail_sends: bool,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new(ManualClock::new())
    }
}

impl MockBus {
    /// Creates a bus whose delivery times follow `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            rx_queue: VecDeque::new(),
            sent: Vec::new(),
            responder: None,
            reply_delay: Duration::ZERO,
            fail_sends: false,
        }
    }

    /// Creates a bus with a peer that answers every sent frame
    pub fn with_responder(clock: ManualClock, responder: MockResponder) -> Self {
        let mut bus = Self::new(clock);
        bus.responder = Some(responder);
        bus
    }

    /// Sets a new responder
    pub fn set_responder(&mut self, responder: Option<MockResponder>) {
        self.responder = responder;
    }

    /// Delay between a sent frame and the responder's answers becoming visible.
    pub fn set_reply_delay(&mut self, delay: Duration) {
        self.reply_delay = delay;
    }

    /// Makes every following `send` fail with a bus error.
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Queues a frame for immediate delivery.
    pub fn push_rx(&mut self, frame: Frame) {
        let now = self.clock.now();
        self.push_rx_at(now, frame);
    }

    /// Queues a frame that becomes visible once simulated time reaches `at`.
    pub fn push_rx_at(&mut self, at: Duration, mut frame: Frame) {
        frame.timestamp = at.as_millis() as u64;
        let pos = self
            .rx_queue
            .iter()
            .position(|(due, _)| *due > at)
            .unwrap_or(self.rx_queue.len());
        self.rx_queue.insert(pos, (at, frame));
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[Frame] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.sent)
    }

    /// Number of queued frames not yet received.
    pub fn pending_rx(&self) -> usize {
        self.rx_queue.len()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }
}

impl FrameTransport for MockBus {
    fn send(&mut self, id: CanId, flags: FrameFlags, data: &[u8]) -> Result<usize> {
        if self.fail_sends {
            return Err(DiagError::Bus("mock bus is off".into()));
        }
        let mut frame = Frame::new(id, flags, data);
        frame.timestamp = self.clock.now().as_millis() as u64;

        if let Some(responder) = self.responder.as_mut() {
            let replies = responder(&frame);
            let due = self.clock.now() + self.reply_delay;
            for reply in replies {
                self.push_rx_at(due, reply);
            }
        }

        self.sent.push(frame);
        Ok(data.len())
    }

    fn recv(&mut self, id: CanId) -> Result<Option<Frame>> {
        let now = self.clock.now();
        let pos = self
            .rx_queue
            .iter()
            .position(|(due, frame)| *due <= now && frame.id == id);
        Ok(pos
            .and_then(|pos| self.rx_queue.remove(pos))
            .map(|(_, frame)| frame))
    }
}
