//! # Hazard Core
//!
//! Per-tick environmental hazard simulation over a [`miasma`] field map.
//!
//! Each tick every active region is swept once. Every live field entry runs
//! the rule of its category and then ages and decays:
//!
//! - **Fire**: burns items and terrain, grows, spreads, climbs and falls,
//!   throws smoke and hot air
//! - **Gases**: diffuse one unit at a time, biased by wind
//! - **Electricity**: seeks ground
//! - **Acid**: seeps down through open floors
//! - **Vents**: cycle between states and erupt
//!
//! Actors standing in fields are resolved separately through
//! [`HazardEngine::expose_actor`]. The world around the map (terrain, items,
//! weather, creatures, vehicles) is lent in through the traits in [`world`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hazard_core::{HazardEngine, MapConfig, TimeDuration, Tripoint, WorldView};
//!
//! let mut engine = HazardEngine::with_standard_types(MapConfig::default(), 42)?;
//! let fire = engine.registry().known().fire;
//! engine.add_field(Tripoint::new(30, 30, 0), fire, 1, TimeDuration::ZERO);
//!
//! let mut world = WorldView::new(&mut terrain, &mut items, &weather, &mut creatures, &mut vehicles);
//! let visibility_changed = engine.advance_tick(&mut world);
//! ```
//!
//! ## Determinism
//!
//! All randomness comes from one seeded ChaCha8 stream owned by the engine,
//! and regions, tiles and slots are always visited in the same order. The
//! same seed, inputs and collaborator answers give the same
//! [`HazardEngine::state_hash`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod diffusion;
pub mod emit;
pub mod engine;
pub mod exposure;
mod fire;
pub mod rng;
mod rules;
pub mod tick;
pub mod wind;
pub mod world;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use emit::{emit_field, propagate_field, Emission};
pub use engine::HazardEngine;
pub use exposure::{ActorExposure, ExposureReport};
pub use rng::SimRng;
pub use tick::{TickProcessor, TickReport};
pub use wind::{LocalWind, WindCache};
pub use world::{
    Actor, ActorTraits, BurnResult, BurnSummary, Creatures, DamageKind, FireData, ItemId,
    NoCreatures, NoObjects, NoVehicles, StatusEffect, StoredObjects, Terrain, TerrainFlags,
    UniformWind, Vehicles, VehicleOccupancy, Weather, Wind, WorldView,
};

pub use miasma::{
    ExposureKind, FieldCategory, FieldEntry, FieldMap, FieldTypeId, FieldTypeRegistry, MapConfig,
    RegionCoord, TimeDuration, Tripoint,
};
