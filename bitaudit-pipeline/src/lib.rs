//! Core audit pipeline for Bitaudit.
//!
//! Raw generator output flows through three stages plus reporting:
//!
//! 1. [`repair`]: patch known formatting defects and parse to JSON
//! 2. [`flatten`]: normalise the hit/bit hierarchy into processable units
//! 3. [`extract`] + [`verify`], driven by [`aggregate`]: decompose each
//!    unit into atomic facts and check every one of them
//!
//! Processing is strictly sequential; the only bound is the unit cap
//! applied during flattening. Failures local to one fact or unit never
//! cross the unit boundary; only unrecoverable documents and missing
//! configuration may halt a run.

pub mod aggregate;
pub mod extract;
pub mod flatten;
pub mod repair;
pub mod report;
pub mod verify;

pub use aggregate::{aggregate, ReportRow};
pub use extract::FactExtractor;
pub use flatten::{flatten, FlattenOptions, ProcessableUnit};
pub use repair::{repair, RepairError, RepairedDocument};
pub use verify::{FactVerifier, GroundedContext, Verdict, VerificationOutcome};
