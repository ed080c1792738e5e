//! Routes and wormholes between planet pairs.
//!
//! A route lets ships travel between two planets that do not share an
//! owner. Some routes carry a wormhole: two time windows, each open for a
//! fixed duration, that are linked to each other. Ships launched down the
//! route while a window is open exit at the matching offset into the other
//! window, possibly in a neighboring universe.
//!
//! # Window Semantics
//!
//! A window starting at `s` is the half-open interval `[s, s + duration)`.
//! The head window is checked before the tail window. Entering the head
//! window at `s_head + k` exits at `s_tail + k`, and the reverse for the
//! tail window.
//!
//! # Universe Pairing
//!
//! A crossing wormhole leads from universe `u` to `(u + 1) mod n` when
//! entered at its head, and to `(u + n - 1) mod n` when entered at its
//! tail, so going through and back returns to the original timeline.

use paradox_types::UniverseId;
use serde::{Deserialize, Serialize};

/// A route between an unordered pair of planets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Route {
    /// Ordinary route.
    Plain,
    /// Route carrying a wormhole.
    Wormhole(Wormhole),
}

impl Route {
    /// The route's wormhole, if any.
    pub const fn wormhole(&self) -> Option<&Wormhole> {
        match self {
            Self::Plain => None,
            Self::Wormhole(w) => Some(w),
        }
    }

    /// Whether launching down this route at `time` enters a wormhole.
    pub fn is_time_route_at(&self, time: f64, open_duration: f64) -> bool {
        self.wormhole().is_some_and(|w| w.is_open(time, open_duration))
    }
}

/// Which of a wormhole's two windows a flight entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WormholeMouth {
    /// The window starting at `head_time`.
    Head,
    /// The window starting at `tail_time`.
    Tail,
}

/// Where and when a flight reappears after passing through a wormhole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WormholeExit {
    /// Universe the flight reappears in.
    pub universe: UniverseId,
    /// Time the flight reappears at.
    pub time: f64,
}

/// Two linked time windows on a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wormhole {
    /// Start of the head window.
    pub head_time: f64,
    /// Start of the tail window.
    pub tail_time: f64,
    /// Whether the wormhole also moves flights to a neighboring universe.
    pub crosses_universe: bool,
}

impl Wormhole {
    /// Which window, if any, is open at `time`.
    pub fn mouth_at(&self, time: f64, open_duration: f64) -> Option<WormholeMouth> {
        if in_window(time, self.head_time, open_duration) {
            Some(WormholeMouth::Head)
        } else if in_window(time, self.tail_time, open_duration) {
            Some(WormholeMouth::Tail)
        } else {
            None
        }
    }

    /// Whether either window is open at `time`.
    pub fn is_open(&self, time: f64, open_duration: f64) -> bool {
        self.mouth_at(time, open_duration).is_some()
    }

    /// Exit point for a flight entering from `universe` at `time`.
    ///
    /// Returns `None` when no window is open at `time` or when
    /// `universe_count` is zero.
    pub fn exit(
        &self,
        universe: UniverseId,
        time: f64,
        open_duration: f64,
        universe_count: u32,
    ) -> Option<WormholeExit> {
        let mouth = self.mouth_at(time, open_duration)?;
        let (entry_start, exit_start) = match mouth {
            WormholeMouth::Head => (self.head_time, self.tail_time),
            WormholeMouth::Tail => (self.tail_time, self.head_time),
        };
        let exit_universe = if self.crosses_universe {
            paired_universe(universe, mouth, universe_count)?
        } else {
            universe
        };
        Some(WormholeExit {
            universe: exit_universe,
            time: exit_start + (time - entry_start),
        })
    }
}

fn in_window(time: f64, start: f64, duration: f64) -> bool {
    time >= start && time < start + duration
}

/// The universe a crossing wormhole leads to from `universe`.
fn paired_universe(
    universe: UniverseId,
    mouth: WormholeMouth,
    universe_count: u32,
) -> Option<UniverseId> {
    let u = universe.into_inner();
    let step = match mouth {
        WormholeMouth::Head => 1,
        WormholeMouth::Tail => universe_count.checked_sub(1)?,
    };
    let next = u.checked_add(step)?.checked_rem(universe_count)?;
    Some(UniverseId::new(next))
}
