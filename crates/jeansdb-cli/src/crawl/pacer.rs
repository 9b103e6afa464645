//! Politeness gate shared by every product worker.

use std::time::Duration;

use tokio::sync::Mutex;

/// Pauses the whole crawl after every `every` top-level products.
///
/// The pause is taken by the product that starts after the threshold, before
/// it fetches anything, and the lock is held while sleeping so no other worker
/// can start a product meanwhile. With one worker this is exactly "after
/// every `every` processed products".
pub(crate) struct Pacer {
    every: usize,
    pause: Duration,
    admitted: Mutex<usize>,
}

impl Pacer {
    /// `every == 0` disables pausing.
    pub(crate) fn new(every: usize, pause: Duration) -> Self {
        Self {
            every,
            pause,
            admitted: Mutex::new(0),
        }
    }

    /// Admits one product. When the products admitted before it reach a
    /// non-zero multiple of `every`, calls `on_pause` with that count and
    /// sleeps before returning. Returns whether this call paused.
    pub(crate) async fn admit<F: FnOnce(usize)>(&self, on_pause: F) -> bool {
        let mut admitted = self.admitted.lock().await;
        let done = *admitted;
        *admitted += 1;
        if self.every == 0 || done == 0 || done % self.every != 0 {
            return false;
        }
        on_pause(done);
        tokio::time::sleep(self.pause).await;
        true
    }
}
