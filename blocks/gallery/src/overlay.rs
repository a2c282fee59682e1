/// Whether the detail overlay is showing, and which record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Closed,
    Open(usize),
}

/// Keys the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    ArrowRight,
    ArrowLeft,
    Escape,
}

impl OverlayKey {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowRight" => Some(OverlayKey::ArrowRight),
            "ArrowLeft" => Some(OverlayKey::ArrowLeft),
            "Escape" => Some(OverlayKey::Escape),
            _ => None,
        }
    }
}

/// Enlarged view of one record out of a collection of `len`.
///
/// Navigation stops at both ends; there is no wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOverlay {
    state: OverlayState,
    len: usize,
}

impl DetailOverlay {
    pub fn new(len: usize) -> Self {
        Self {
            state: OverlayState::Closed,
            len,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn current(&self) -> Option<usize> {
        match self.state {
            OverlayState::Open(index) => Some(index),
            OverlayState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }

    /// Out-of-range indexes leave the overlay as it was.
    pub fn open(&mut self, index: usize) {
        if index < self.len {
            self.state = OverlayState::Open(index);
        }
    }

    pub fn close(&mut self) {
        self.state = OverlayState::Closed;
    }

    pub fn has_next(&self) -> bool {
        matches!(self.state, OverlayState::Open(i) if i + 1 < self.len)
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.state, OverlayState::Open(i) if i > 0)
    }

    pub fn next(&mut self) {
        if let OverlayState::Open(i) = self.state {
            if self.has_next() {
                self.state = OverlayState::Open(i + 1);
            }
        }
    }

    pub fn previous(&mut self) {
        if let OverlayState::Open(i) = self.state {
            if self.has_previous() {
                self.state = OverlayState::Open(i - 1);
            }
        }
    }

    /// Returns true when the key changed something.
    pub fn handle_key(&mut self, key: OverlayKey) -> bool {
        let before = self.state;
        match key {
            OverlayKey::ArrowRight => self.next(),
            OverlayKey::ArrowLeft => self.previous(),
            OverlayKey::Escape => self.close(),
        }
        before != self.state
    }

    /// The collection changed size. An index that no longer exists closes.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if matches!(self.state, OverlayState::Open(i) if i >= len) {
            self.state = OverlayState::Closed;
        }
    }
}
