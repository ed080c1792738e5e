//! Enumeration types for the Paradox simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How a flight relates to the wormhole network.
///
/// A flight sent down a route whose wormhole is open at launch time is
/// recorded twice: once in the origin universe as [`FlightKind::DepartViaWormhole`]
/// (fading out, no effect on arrival), and once at the wormhole exit as
/// [`FlightKind::ArriveViaWormhole`] (fading in, resolves normally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FlightKind {
    /// Ordinary transit within one universe.
    Normal,
    /// The departing half of a time-travel flight. Its ships leave the
    /// universe when the flight ends.
    DepartViaWormhole,
    /// The arriving half of a time-travel flight, injected by relaxation.
    ArriveViaWormhole,
}

impl FlightKind {
    /// Whether the flight resolves against its target planet when it ends.
    pub const fn lands(self) -> bool {
        matches!(self, Self::Normal | Self::ArriveViaWormhole)
    }
}
