//! Auto-reset event used for the dispatcher/worker rendezvous

use parking_lot::{Condvar, Mutex};

/// Binary event: `set` wakes one waiter, `wait` consumes the signal
#[derive(Default)]
pub struct Event {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl Event {
    pub fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cond.notify_one();
    }

    /// Block until the event is set, then reset it
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.cond.wait(&mut signaled);
        }
        *signaled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_before_wait() {
        let event = Event::new();
        event.set();
        event.wait();
    }

    #[test]
    fn test_ping_pong() {
        let ping = Arc::new(Event::new());
        let pong = Arc::new(Event::new());

        let worker = {
            let ping = ping.clone();
            let pong = pong.clone();
            std::thread::spawn(move || {
                for _ in 0..3 {
                    ping.wait();
                    pong.set();
                }
            })
        };

        for _ in 0..3 {
            ping.set();
            pong.wait();
        }
        worker.join().unwrap();
    }
}
