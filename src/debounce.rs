/// Holds off repeated discrete actions while a gesture stays held.
///
/// Check [`DebounceGate::is_pending`] before classifying and call
/// [`DebounceGate::tick`] once at the end of every tick, including the one that
/// armed the gate. Armed at tick `T`, gestures are skipped for `T+1..=T+delay`.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    pending: bool,
    counter: u32,
    delay: u32,
}

impl DebounceGate {
    pub const DEFAULT_DELAY: u32 = 20;

    pub fn new(delay: u32) -> Self {
        Self { pending: false, counter: 0, delay }
    }

    pub fn arm(&mut self) {
        self.pending = true;
        self.counter = 0;
    }

    pub fn tick(&mut self) {
        if !self.pending {
            return;
        }
        self.counter += 1;
        if self.counter > self.delay {
            self.pending = false;
            self.counter = 0;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}
