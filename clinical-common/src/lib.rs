//! Shared clinical data model for Tibb Engine
//!
//! Closed-domain types for biosignal findings and the three supported
//! medical traditions. Every attribute a vision analysis can produce is an
//! enumerated value; an absent or unrecognized attribute is `None`, never a
//! free-form string. The same `FindingMap` shape describes both an extracted
//! finding bag and a knowledge record's characteristic map, which is what
//! makes the two directly comparable in the matching engine.

pub mod findings;
pub mod tradition;

pub use findings::*;
pub use tradition::*;
