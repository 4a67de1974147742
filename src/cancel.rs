use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Shared cancellation signal.
///
/// Cloned handles all observe the same state. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    wake_send: Sender<()>,
    wake_receive: Receiver<()>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (wake_send, wake_receive) = bounded(1);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            wake_send,
            wake_receive,
        }
    }

    /// Request the cancellation and wake up any current waiter
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // A full channel means a wake-up is already pending
        let _ = self.wake_send.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for the given duration or until cancelled.
    ///
    /// Return `true` if the wait was interrupted by a cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        if duration.is_zero() {
            return false;
        }

        match self.wake_receive.recv_timeout(duration) {
            Ok(()) => self.is_cancelled(),
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
            // Cannot happen while we hold a sender, treat it as a stop request
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Install this token as the Ctrl-C handler
    pub fn install_ctrlc_handler(&self) -> miette::Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            if token.is_cancelled() {
                // Second interrupt: the user really wants out
                std::process::exit(130);
            }
            token.cancel();
        })
        .map_err(|err| miette::miette!("Could not install the Ctrl-C handler: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn sleep_runs_to_completion_without_cancel() {
        let token = Cancellation::new();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cancel_interrupts_sleep() {
        let token = Cancellation::new();
        let other = token.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            other.cancel();
        });

        let start = Instant::now();
        assert!(token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn cancelled_token_returns_immediately() {
        let token = Cancellation::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.sleep(Duration::from_secs(10)));
    }
}
