// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typing indicator debouncing.
//!
//! Outbound: input changes collapse into at most one typing frame per
//! debounce window, with a trailing `typing: false` once the input goes
//! idle. Inbound: a remote typing notice expires after a fixed window
//! unless refreshed. Both sides are plain `Instant` arithmetic; the
//! session owns the actual timers.

use std::time::Duration;

use tokio::time::Instant;
use wisp_core::frame::OutboundFrame;

/// Rate-limits outgoing typing-status frames.
#[derive(Debug)]
pub struct TypingDebouncer {
    debounce: Duration,
    idle_expire: Duration,
    active: bool,
    last_frame_at: Option<Instant>,
    last_input_at: Option<Instant>,
}

impl TypingDebouncer {
    pub fn new(debounce: Duration, idle_expire: Duration) -> Self {
        Self {
            debounce,
            idle_expire,
            active: false,
            last_frame_at: None,
            last_input_at: None,
        }
    }

    /// Notes an input change. Returns a frame to transmit when the
    /// typing state flipped, or when an active state is due a refresh
    /// (at most once per debounce window).
    pub fn on_input(&mut self, content: &str, now: Instant) -> Option<OutboundFrame> {
        let content = content.trim();
        let is_typing = !content.is_empty();
        self.last_input_at = Some(now);

        let state_changed = is_typing != self.active;
        let refresh_due = is_typing
            && self
                .last_frame_at
                .is_none_or(|at| now.duration_since(at) >= self.debounce);

        if state_changed || refresh_due {
            self.active = is_typing;
            self.last_frame_at = Some(now);
            return Some(OutboundFrame::typing(is_typing, content));
        }
        None
    }

    /// When a trailing `typing: false` should fire, if the user stays idle.
    pub fn idle_deadline(&self) -> Option<Instant> {
        if !self.active {
            return None;
        }
        self.last_input_at.map(|at| at + self.idle_expire)
    }

    /// Called when the idle deadline elapsed. Returns the trailing
    /// `typing: false` frame, once.
    pub fn on_idle_expired(&mut self, now: Instant) -> Option<OutboundFrame> {
        let deadline = self.idle_deadline()?;
        if now < deadline {
            return None;
        }
        self.active = false;
        self.last_frame_at = Some(now);
        Some(OutboundFrame::typing(false, ""))
    }
}

/// Tracks the auto-expiry window of a remote participant's typing notice.
#[derive(Debug)]
pub struct RemoteTypingWindow {
    expire: Duration,
    deadline: Option<Instant>,
}

impl RemoteTypingWindow {
    pub fn new(expire: Duration) -> Self {
        Self {
            expire,
            deadline: None,
        }
    }

    /// Notes an inbound typing notice; `active: false` clears the window.
    pub fn note(&mut self, active: bool, now: Instant) {
        self.deadline = active.then(|| now + self.expire);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once when the notice expired without a refresh.
    pub fn expire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_core::frame::OutboundFrame;

    fn typing_flag(frame: &OutboundFrame) -> bool {
        match frame {
            OutboundFrame::Typing { typing, .. } => *typing,
            other => panic!("expected typing frame, got {other:?}"),
        }
    }

    #[test]
    fn first_keystroke_emits_immediately() {
        let mut debouncer =
            TypingDebouncer::new(Duration::from_millis(1000), Duration::from_millis(2500));
        let now = Instant::now();
        let frame = debouncer.on_input("H", now).expect("first input emits");
        assert!(typing_flag(&frame));
    }

    #[test]
    fn rapid_keystrokes_are_collapsed() {
        let mut debouncer =
            TypingDebouncer::new(Duration::from_millis(1000), Duration::from_millis(2500));
        let now = Instant::now();
        assert!(debouncer.on_input("H", now).is_some());
        assert!(debouncer
            .on_input("He", now + Duration::from_millis(100))
            .is_none());
        assert!(debouncer
            .on_input("Hel", now + Duration::from_millis(900))
            .is_none());
        // Past the debounce window, a refresh goes out.
        assert!(debouncer
            .on_input("Hell", now + Duration::from_millis(1100))
            .is_some());
    }

    #[test]
    fn clearing_the_input_flips_state_immediately() {
        let mut debouncer =
            TypingDebouncer::new(Duration::from_millis(1000), Duration::from_millis(2500));
        let now = Instant::now();
        assert!(debouncer.on_input("Hi", now).is_some());
        let frame = debouncer
            .on_input("", now + Duration::from_millis(50))
            .expect("state change bypasses debounce");
        assert!(!typing_flag(&frame));
    }

    #[test]
    fn idle_expiry_sends_trailing_false_once() {
        let mut debouncer =
            TypingDebouncer::new(Duration::from_millis(1000), Duration::from_millis(2500));
        let now = Instant::now();
        debouncer.on_input("Hi", now);

        let deadline = debouncer.idle_deadline().expect("active input has deadline");
        assert!(debouncer.on_idle_expired(deadline - Duration::from_millis(1)).is_none());

        let frame = debouncer.on_idle_expired(deadline).expect("deadline fires");
        assert!(!typing_flag(&frame));
        assert!(debouncer.idle_deadline().is_none());
        assert!(debouncer.on_idle_expired(deadline).is_none());
    }

    #[test]
    fn remote_window_expires_once() {
        let mut window = RemoteTypingWindow::new(Duration::from_millis(2500));
        let now = Instant::now();
        window.note(true, now);

        assert!(!window.expire_if_due(now + Duration::from_millis(2000)));
        assert!(window.expire_if_due(now + Duration::from_millis(2500)));
        assert!(!window.expire_if_due(now + Duration::from_millis(5000)));
    }

    #[test]
    fn remote_window_refresh_extends_deadline() {
        let mut window = RemoteTypingWindow::new(Duration::from_millis(2500));
        let now = Instant::now();
        window.note(true, now);
        window.note(true, now + Duration::from_millis(2000));

        assert!(!window.expire_if_due(now + Duration::from_millis(2500)));
        assert!(window.expire_if_due(now + Duration::from_millis(4500)));
    }

    #[test]
    fn remote_stop_notice_clears_window() {
        let mut window = RemoteTypingWindow::new(Duration::from_millis(2500));
        let now = Instant::now();
        window.note(true, now);
        window.note(false, now + Duration::from_millis(100));
        assert!(window.deadline().is_none());
        assert!(!window.expire_if_due(now + Duration::from_millis(5000)));
    }
}
