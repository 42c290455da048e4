//! Access gate shown before the demo
//!
//! A plain string compare that flips an "unlocked" flag. It keeps casual
//! visitors out of an unfinished demo and nothing more.

use tracing::{info, warn};

pub struct AccessGate {
    code: String,
    unlocked: bool,
}

impl AccessGate {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            unlocked: false,
        }
    }

    #[cfg(test)]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Unlock if `input` matches; once unlocked the gate stays open
    pub fn try_unlock(&mut self, input: &str) -> bool {
        if self.unlocked {
            return true;
        }
        if input == self.code {
            self.unlocked = true;
            info!("access gate unlocked");
        } else {
            warn!("access code rejected");
        }
        self.unlocked
    }
}
