use crate::color::Rgb;
use crate::session::FlashRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveFlash {
    id: FlashId,
    color: Rgb,
}

/// The full-screen flash. Each shown flash gets a fresh id; the owner
/// schedules `expire(id)` after the requested duration.
#[derive(Debug, Default)]
pub struct FlashOverlay {
    active: Option<ActiveFlash>,
    next_id: u64,
}

impl FlashOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, request: &FlashRequest) -> FlashId {
        self.next_id += 1;
        let id = FlashId(self.next_id);
        self.active = Some(ActiveFlash {
            id,
            color: request.color,
        });
        id
    }

    /// Hides the flash if `id` is still the one on screen.
    pub fn expire(&mut self, id: FlashId) -> bool {
        match self.active {
            Some(active) if active.id == id => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn color(&self) -> Option<Rgb> {
        self.active.map(|a| a.color)
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }
}
