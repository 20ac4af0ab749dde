//! Client intent production

use shared::{Arena, Controller, Intent, RandomPolicy};

/// Produces the local avatar's intent each prediction step and remembers the latest
/// one for upload
pub struct InputManager {
    controller: Controller,
    current_intent: Intent,
}

impl InputManager {
    /// An avatar that stands still and never fires.
    pub fn idle() -> Self {
        Self::with_controller(Controller::Input(Intent::default()))
    }

    /// An avatar driven by the seeded random policy.
    pub fn bot(seed: u64) -> Self {
        Self::with_controller(Controller::Policy(RandomPolicy::new(seed)))
    }

    fn with_controller(controller: Controller) -> Self {
        Self {
            controller,
            current_intent: Intent::default(),
        }
    }

    /// Samples the intent for this step.
    pub fn update(&mut self, dt: f32, arena: &Arena) -> Intent {
        if let Some(intent) = self.controller.next_intent(dt, arena) {
            self.current_intent = intent;
        }
        self.current_intent
    }

    /// Returns the most recently sampled intent
    pub fn get_current_intent(&self) -> Intent {
        self.current_intent
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::idle()
    }
}
