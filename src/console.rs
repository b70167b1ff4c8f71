//! Screen-safe logging.
//!
//! While the trainer screen is up, a stray write to stdout/stderr tears the
//! display. Code that wants to report something publishes here instead; the
//! screen subscribes and shows messages in its log pane. With no subscriber,
//! messages at or above the fallback level go to stderr.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn from_u8(v: u8) -> Level {
        match v {
            0 => Level::Info,
            1 => Level::Warn,
            _ => Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub text: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Info => write!(f, "{}", self.text),
            Level::Warn => write!(f, "warning: {}", self.text),
            Level::Error => write!(f, "error: {}", self.text),
        }
    }
}

struct Hub {
    next_id: AtomicUsize,
    fallback: AtomicU8,
    subscribers: Mutex<HashMap<usize, Sender<LogMessage>>>,
}

static HUB: Lazy<Hub> = Lazy::new(|| Hub {
    next_id: AtomicUsize::new(1),
    fallback: AtomicU8::new(Level::Warn as u8),
    subscribers: Mutex::new(HashMap::new()),
});

/// Receives every message published after it was created. Dropping it unsubscribes.
pub struct Subscription {
    id: usize,
    rx: Receiver<LogMessage>,
}

impl Subscription {
    pub fn drain(&self) -> Vec<LogMessage> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut subs) = HUB.subscribers.lock() {
            subs.remove(&self.id);
        }
    }
}

pub fn subscribe() -> Subscription {
    let (tx, rx) = mpsc::channel();
    let id = HUB.next_id.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut subs) = HUB.subscribers.lock() {
        subs.insert(id, tx);
    }
    Subscription { id, rx }
}

/// Lowest level printed to stderr while nobody is subscribed.
pub fn set_fallback_level(level: Level) {
    HUB.fallback.store(level as u8, Ordering::Relaxed);
}

pub fn fallback_level() -> Level {
    Level::from_u8(HUB.fallback.load(Ordering::Relaxed))
}

pub fn info(msg: impl Into<String>) {
    publish(Level::Info, msg.into());
}

pub fn warn(msg: impl Into<String>) {
    publish(Level::Warn, msg.into());
}

pub fn error(msg: impl Into<String>) {
    publish(Level::Error, msg.into());
}

fn publish(level: Level, text: String) {
    let message = LogMessage { level, text };
    let delivered = match HUB.subscribers.lock() {
        Ok(mut subs) => {
            subs.retain(|_, tx| tx.send(message.clone()).is_ok());
            !subs.is_empty()
        }
        Err(_) => false,
    };
    if !delivered && message.level >= fallback_level() {
        eprintln!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_all_levels() {
        let sub = subscribe();
        info("tempo 90");
        warn("sample missing");
        error("decode failed");

        let msgs = sub.drain();
        assert!(msgs.iter().any(|m| m.level == Level::Info && m.text == "tempo 90"));
        assert!(msgs.iter().any(|m| m.level == Level::Warn && m.text == "sample missing"));
        assert!(msgs.iter().any(|m| m.level == Level::Error && m.text == "decode failed"));
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let sub = subscribe();
        let id = sub.id;
        drop(sub);
        let subs = HUB.subscribers.lock().expect("lock");
        assert!(!subs.contains_key(&id));
    }

    #[test]
    fn messages_render_with_level_prefix() {
        let warn = LogMessage { level: Level::Warn, text: "kick1.mp3 missing".into() };
        assert_eq!(warn.to_string(), "warning: kick1.mp3 missing");
        let info = LogMessage { level: Level::Info, text: "started".into() };
        assert_eq!(info.to_string(), "started");
    }

    #[test]
    fn level_round_trips_through_fallback_encoding() {
        for level in [Level::Info, Level::Warn, Level::Error] {
            assert_eq!(Level::from_u8(level as u8), level);
        }
        assert!(Level::Error > Level::Warn);
    }
}
