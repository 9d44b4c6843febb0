use std::num::NonZeroUsize;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::Politeness;

/// Pauses the crawl once every `every` fetch-equivalent units.
#[derive(Debug, Clone)]
pub struct PolitenessThrottle {
    every: NonZeroUsize,
    pause: Duration,
    count: usize,
    pauses: usize,
}

impl PolitenessThrottle {
    pub fn new(every: NonZeroUsize, pause: Duration) -> Self {
        Self {
            every,
            pause,
            count: 0,
            pauses: 0,
        }
    }

    /// Counts one unit, sleeping and resetting the counter when the window is full.
    ///
    /// Returns whether a pause happened.
    pub async fn acquire(&mut self) -> bool {
        self.count += 1;
        if self.count < self.every.get() {
            return false;
        }
        sleep(self.pause).await;
        self.count = 0;
        self.pauses += 1;
        true
    }

    /// Units counted since the last pause
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }
}

impl From<&Politeness> for PolitenessThrottle {
    fn from(p: &Politeness) -> Self {
        Self::new(p.every, p.pause())
    }
}

impl Default for PolitenessThrottle {
    fn default() -> Self {
        (&Politeness::default()).into()
    }
}
