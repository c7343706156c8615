pub const RESIZE_DEBOUNCE_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A single cancellable deadline. Arming again replaces the previous one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerHandle {
    deadline: Option<f64>,
}

impl TimerHandle {
    pub fn arm(&mut self, now: f64, delay_ms: f64) -> f64 {
        let deadline = now + delay_ms;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    pub fn is_due(&self, now: f64) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}

/// Keeps the canvas sized to its container. Observations are collapsed
/// until the container has been quiet for the debounce delay, and only
/// the last observed size is committed.
pub struct ResizeDebouncer {
    delay_ms: f64,
    current: Option<Size>,
    pending: Option<Size>,
    timer: TimerHandle,
    commits: u32,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE_MS)
    }
}

impl ResizeDebouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            current: None,
            pending: None,
            timer: TimerHandle::default(),
            commits: 0,
        }
    }

    /// First measurement is committed right away.
    pub fn mount(&mut self, size: Size) -> bool {
        self.timer.cancel();
        self.pending = None;
        self.commit(size)
    }

    /// Records a size change and returns the deadline at which `poll`
    /// should be called.
    pub fn observe(&mut self, size: Size, now: f64) -> f64 {
        self.pending = Some(size);
        self.timer.arm(now, self.delay_ms)
    }

    /// Commits the pending size once the deadline has passed. Returns the
    /// size only when it differs from the committed one.
    pub fn poll(&mut self, now: f64) -> Option<Size> {
        if !self.timer.is_due(now) {
            return None;
        }
        self.timer.cancel();
        let size = self.pending.take()?;
        self.commit(size).then_some(size)
    }

    pub fn unmount(&mut self) {
        self.timer.cancel();
        self.pending = None;
    }

    pub fn current(&self) -> Option<Size> {
        self.current
    }

    pub fn deadline(&self) -> Option<f64> {
        self.timer.deadline()
    }

    pub fn commits(&self) -> u32 {
        self.commits
    }

    fn commit(&mut self, size: Size) -> bool {
        if self.current == Some(size) {
            return false;
        }
        self.current = Some(size);
        self.commits += 1;
        true
    }
}
