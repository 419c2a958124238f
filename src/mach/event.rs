use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Event sources a program can trap with ON ... GOSUB. Declaration
/// order is dispatch priority when several are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trap {
    Key(u8),
    Timer,
    Com(u8),
    Pen,
    Strig(u8),
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapState {
    Off,
    On,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: TrapState,
    handler: Option<u16>,
    pending: bool,
}

impl Default for Entry {
    fn default() -> Entry {
        Entry {
            state: TrapState::Off,
            handler: None,
            pending: false,
        }
    }
}

/// ## Event traps
///
/// Events raised while a trap is OFF are lost. Events raised while it is
/// STOPPED are remembered and fire once it is turned ON again.
#[derive(Debug, Default)]
pub struct Traps {
    entries: BTreeMap<Trap, Entry>,
    interval: Option<Duration>,
    deadline: Option<Instant>,
}

impl Traps {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.interval = None;
        self.deadline = None;
    }

    pub fn set_handler(&mut self, trap: Trap, line: Option<u16>) {
        self.entries.entry(trap).or_default().handler = line;
    }

    pub fn set_timer_interval(&mut self, seconds: f64) {
        self.interval = Some(Duration::from_secs_f64(seconds.max(0.0)));
        self.deadline = None;
    }

    pub fn set_state(&mut self, trap: Trap, state: TrapState, now: Instant) {
        let entry = self.entries.entry(trap).or_default();
        entry.state = state;
        if state == TrapState::Off {
            entry.pending = false;
        }
        if trap == Trap::Timer {
            self.deadline = match (state, self.interval) {
                (TrapState::Off, _) | (_, None) => None,
                (_, Some(interval)) => self.deadline.or(Some(now + interval)),
            };
        }
    }

    pub fn raise(&mut self, trap: Trap) {
        if let Some(entry) = self.entries.get_mut(&trap) {
            if entry.state != TrapState::Off {
                entry.pending = true;
            }
        }
    }

    /// Raise the timer trap if its interval has elapsed.
    pub fn poll_timer(&mut self, now: Instant) {
        if let (Some(deadline), Some(interval)) = (self.deadline, self.interval) {
            if now >= deadline {
                self.deadline = Some(now + interval);
                self.raise(Trap::Timer);
            }
        }
    }

    /// Take the highest priority trap that is ON, pending, and has a
    /// handler. It is left STOPPED until `rearm`.
    pub fn take_pending(&mut self) -> Option<(Trap, u16)> {
        for (trap, entry) in self.entries.iter_mut() {
            if entry.state == TrapState::On && entry.pending {
                if let Some(line) = entry.handler {
                    entry.pending = false;
                    entry.state = TrapState::Stopped;
                    return Some((*trap, line));
                }
            }
        }
        None
    }

    /// Return from a handler: a trap stopped by dispatch goes back ON.
    pub fn rearm(&mut self, trap: Trap) {
        if let Some(entry) = self.entries.get_mut(&trap) {
            if entry.state == TrapState::Stopped {
                entry.state = TrapState::On;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_and_stop() {
        let now = Instant::now();
        let mut traps = Traps::default();
        traps.set_handler(Trap::Key(2), Some(100));
        traps.set_handler(Trap::Com(1), Some(200));
        traps.set_state(Trap::Key(2), TrapState::On, now);
        traps.set_state(Trap::Com(1), TrapState::On, now);
        traps.raise(Trap::Com(1));
        traps.raise(Trap::Key(2));
        assert_eq!(traps.take_pending(), Some((Trap::Key(2), 100)));
        traps.raise(Trap::Key(2));
        assert_eq!(traps.take_pending(), Some((Trap::Com(1), 200)));
        assert_eq!(traps.take_pending(), None);
        traps.rearm(Trap::Key(2));
        assert_eq!(traps.take_pending(), Some((Trap::Key(2), 100)));
    }

    #[test]
    fn test_off_loses_events() {
        let now = Instant::now();
        let mut traps = Traps::default();
        traps.set_handler(Trap::Pen, Some(10));
        traps.raise(Trap::Pen);
        traps.set_state(Trap::Pen, TrapState::On, now);
        assert_eq!(traps.take_pending(), None);
    }

    #[test]
    fn test_timer() {
        let now = Instant::now();
        let mut traps = Traps::default();
        traps.set_handler(Trap::Timer, Some(50));
        traps.set_timer_interval(1.0);
        traps.set_state(Trap::Timer, TrapState::On, now);
        traps.poll_timer(now);
        assert_eq!(traps.take_pending(), None);
        traps.poll_timer(now + Duration::from_millis(1500));
        assert_eq!(traps.take_pending(), Some((Trap::Timer, 50)));
    }
}
