//! Frame Scheduling
//!
//! Structural mutations of the node or edge array invalidate the layout, and
//! a burst of mutations (a loop of `push` calls, say) would invalidate it many
//! times over. Layout recomputation is expensive, so invalidation only
//! *requests* a recomputation on the next animation frame, and at most one
//! request per controller is ever outstanding.
//!
//! # Pieces
//!
//! - [`FrameScheduler`]: the host's "run this on the next frame" primitive.
//!   Requests are identified by [`FrameId`] and can be cancelled.
//! - [`FrameQueue`]: a reference scheduler. The host drains it once per frame
//!   with [`FrameQueue::run_frame`] and hands each request to its owner.
//! - [`ResyncScheduler`]: the single-flight debounce owned by a controller.
//!
//! # Delivery
//!
//! A request names its owner. The owner accepts a delivered request only if
//! it is the request it is still waiting for ([`ResyncScheduler::acknowledge`]),
//! so a request that outlived a cancel, or that belongs to a destroyed
//! controller, does nothing.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies whoever requested a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Generate a new unique owner ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// A request for a callback on the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    pub id: FrameId,
    pub owner: OwnerId,
}

/// The host's deferred-task primitive.
pub trait FrameScheduler {
    /// Ask for `owner` to be called back on the next frame.
    fn request_frame(&self, owner: OwnerId) -> FrameRequest;

    /// Withdraw a request that has not been delivered yet.
    fn cancel_frame(&self, id: FrameId);
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    requests: VecDeque<FrameRequest>,
}

/// A shareable queue of frame requests.
///
/// Clones share the same queue, so the host keeps one clone to drive frames
/// and hands another to each controller.
#[derive(Clone, Default)]
pub struct FrameQueue {
    state: Arc<Mutex<QueueState>>,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests waiting for the next frame.
    pub fn len(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Whether no request is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every waiting request, leaving the queue empty.
    pub fn take_frame(&self) -> Vec<FrameRequest> {
        self.state.lock().requests.drain(..).collect()
    }

    /// Run one frame: deliver every waiting request to `dispatch`.
    ///
    /// The queue is drained before dispatching, so requests made by the
    /// callbacks wait for the following frame. Returns how many requests
    /// were delivered.
    pub fn run_frame<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(FrameRequest),
    {
        let requests = self.take_frame();
        let delivered = requests.len();
        for request in requests {
            dispatch(request);
        }
        delivered
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, owner: OwnerId) -> FrameRequest {
        let mut state = self.state.lock();
        let request = FrameRequest {
            id: FrameId(state.next_id),
            owner,
        };
        state.next_id += 1;
        state.requests.push_back(request);
        request
    }

    fn cancel_frame(&self, id: FrameId) {
        self.state.lock().requests.retain(|request| request.id != id);
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue").field("pending", &self.len()).finish()
    }
}

/// Single-flight debounce for layout resyncs.
///
/// [`schedule`](Self::schedule) requests a frame unless one is already
/// pending. When the frame arrives the owner calls
/// [`acknowledge`](Self::acknowledge), which clears the pending flag and
/// tells the owner whether to run the resync.
pub struct ResyncScheduler {
    owner: OwnerId,
    frames: Arc<dyn FrameScheduler>,
    pending: Option<FrameId>,
    cancelled: bool,
    resync_count: usize,
}

impl ResyncScheduler {
    pub fn new(owner: OwnerId, frames: Arc<dyn FrameScheduler>) -> Self {
        Self {
            owner,
            frames,
            pending: None,
            cancelled: false,
            resync_count: 0,
        }
    }

    /// The owner this scheduler requests frames for.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Mark the layout stale.
    ///
    /// Returns `true` if a new frame was requested, `false` if one was
    /// already pending or the scheduler was cancelled.
    pub fn schedule(&mut self) -> bool {
        if self.cancelled || self.pending.is_some() {
            return false;
        }
        let request = self.frames.request_frame(self.owner);
        tracing::debug!(owner = ?self.owner, frame = ?request.id, "scheduled layout resync");
        self.pending = Some(request.id);
        true
    }

    /// Whether a resync is waiting for its frame.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a delivered frame.
    ///
    /// Returns `true` only for the pending request of this owner; the
    /// pending flag is cleared before returning so the resync it triggers
    /// may schedule the next one.
    pub fn acknowledge(&mut self, request: FrameRequest) -> bool {
        if self.cancelled || request.owner != self.owner || self.pending != Some(request.id) {
            tracing::trace!(?request, pending = ?self.pending, "ignoring stale frame");
            return false;
        }
        self.pending = None;
        self.resync_count += 1;
        true
    }

    /// Cancel the pending request and refuse all further scheduling.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        if let Some(id) = self.pending.take() {
            self.frames.cancel_frame(id);
        }
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of resyncs acknowledged so far.
    pub fn resync_count(&self) -> usize {
        self.resync_count
    }
}

impl fmt::Debug for ResyncScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResyncScheduler")
            .field("owner", &self.owner)
            .field("pending", &self.pending)
            .field("cancelled", &self.cancelled)
            .field("resync_count", &self.resync_count)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
