//! Combat outcome engine for a tick-based combat simulator: exact per-hit
//! damage distributions, derived scalar statistics, time-to-kill
//! distributions, and the dispatch layer that runs the expensive parts off
//! the interactive path.

pub mod compare;
pub mod dispatch;
mod dist;
mod error;
pub mod model;
mod outcome;
pub mod prelude;
mod rolls;
mod stats;
pub mod ttk;
mod util;

pub use dist::{Histogram, HitDist};
pub use error::{CalcError, CalcResult, ErrorInfo, ErrorKind};
pub use outcome::{AttackCalc, AttackOutcome, DetailEntry};
pub use rolls::RollPair;
pub use stats::{loadout_stats, LoadoutStats};
pub use util::{Damage, PROTECTION_PRAYER_DAMAGE_REDUCTION, SECONDS_PER_TICK};
