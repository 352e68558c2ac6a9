// # Fogwall: A Fog of Wall Exploration Agent
//
// The game server hides walls on a square grid and asks us, one HTTP request
// at a time, what our crows should do next: scan their 5x5 surroundings, move
// one cell, or submit the walls found so far.
//
// The HTTP surface (`www`) and the remote client (`client`) sit behind the
// `actix-web` and `reqwest` features; everything else is plain library code.

/// Grid geometry and the read-only view the policy works against.
pub mod grid;

/// What is known about one game's grid.
pub mod knowledge;

/// Tunable constants, with environment overrides.
pub mod config;

/// Caller-visible errors.
pub mod error;

/// Per-game state.
pub mod session;

/// Merging scan and move outcomes into a session.
pub mod sensor;

/// Pure next-action selection.
pub mod policy;

/// Termination checks and the fail-safe around the policy.
pub mod budget;

/// Storage of live sessions.
pub mod registry;

/// JSON payloads of the game endpoint.
pub mod protocol;

/// One request, end to end.
pub mod service;

/// Local stand-in for the game server.
pub mod judge;

/// Tools for generating hidden layouts.
pub mod mapgen {
    /// A module for generating random layouts.
    pub mod random;
}

/// WWW server implementation. Enabled with the `actix-web` feature.
#[cfg(feature = "actix-web")]
pub mod www;

/// HTTP player for the local judge. Enabled with the `reqwest` feature.
#[cfg(feature = "reqwest")]
pub mod client;

/// A trait for conveniently updating a value to its minimum or maximum.
pub trait SetMinMax {
    /// If `v` is less than `self`, updates `self` to `v` and returns `true`.
    /// Otherwise, returns `false`.
    fn setmin(&mut self, v: Self) -> bool;
    /// If `v` is greater than `self`, updates `self` to `v` and returns `true`.
    /// Otherwise, returns `false`.
    fn setmax(&mut self, v: Self) -> bool;
}
impl<T> SetMinMax for T
where
    T: PartialOrd,
{
    fn setmin(&mut self, v: T) -> bool {
        *self > v && {
            *self = v;
            true
        }
    }
    fn setmax(&mut self, v: T) -> bool {
        *self < v && {
            *self = v;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_min_max() {
        let mut v = 3;
        assert!(!v.setmax(2));
        assert!(v.setmax(5));
        assert!(v.setmin(1));
        assert_eq!(v, 1);
    }
}
