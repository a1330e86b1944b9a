use std::{
    cell::RefCell,
    rc::Rc,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use serde_json::Value;

use crate::realtime::channel::{Channel, ChannelError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct ChannelLog {
    opened: Vec<String>,
    sent: Vec<String>,
    armed: Vec<Duration>,
    disarmed: usize,
    closed: usize,
    is_open: bool,
}

/// In-memory [`Channel`] that records every call. Clones share the log so a
/// test can keep a handle after moving the channel into a transport.
#[derive(Debug, Clone, Default)]
pub struct FakeChannel {
    log: Rc<RefCell<ChannelLog>>,
}

impl FakeChannel {
    pub fn opened(&self) -> Vec<String> {
        self.log.borrow().opened.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.log.borrow().sent.clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.log
            .borrow()
            .sent
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("sent frame should be json"))
            .collect()
    }

    pub fn armed(&self) -> Vec<Duration> {
        self.log.borrow().armed.clone()
    }

    pub fn disarmed(&self) -> usize {
        self.log.borrow().disarmed
    }

    pub fn closed(&self) -> usize {
        self.log.borrow().closed
    }
}

impl Channel for FakeChannel {
    fn open(&mut self, url: &str) {
        let mut log = self.log.borrow_mut();
        log.opened.push(url.to_owned());
        log.is_open = true;
    }

    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        let mut log = self.log.borrow_mut();
        if !log.is_open {
            return Err(ChannelError::NotOpen);
        }
        log.sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        let mut log = self.log.borrow_mut();
        log.closed += 1;
        log.is_open = false;
    }

    fn arm_timer(&mut self, delay: Duration) {
        self.log.borrow_mut().armed.push(delay);
    }

    fn disarm_timer(&mut self) {
        self.log.borrow_mut().disarmed += 1;
    }
}
