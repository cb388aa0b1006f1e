//! What standing in a field does to an actor.
//!
//! Every live entry on the actor's tile is resolved once. Newborn entries
//! (age zero) are skipped unless their type is felt on contact, so a field
//! created this turn does not hit an actor before it has existed for a tick.
//! Damage spread over several body parts is summed and dealt in one call.

use serde::{Deserialize, Serialize};
use tracing::trace;

use miasma::{ExposureKind, FieldMap, TimeDuration};

use crate::rng::SimRng;
use crate::world::{Actor, ActorTraits, DamageKind, StatusEffect, VehicleOccupancy};

/// Outcome of exposing one actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureReport {
    /// Entries that did something to the actor.
    pub effects_applied: u32,
    /// Total damage actually taken.
    pub damage_dealt: i32,
    /// Entries used up by the actor (webs torn, sludge churned).
    pub fields_consumed: u32,
}

/// Applies the fields on an actor's tile to the actor.
pub struct ActorExposure<'a> {
    map: &'a mut FieldMap,
    rng: &'a mut SimRng,
}

impl<'a> ActorExposure<'a> {
    /// Bind to a map and the engine's random source.
    pub fn new(map: &'a mut FieldMap, rng: &'a mut SimRng) -> Self {
        Self { map, rng }
    }

    /// Expose `actor` to every live field on its tile.
    pub fn apply(&mut self, actor: &mut dyn Actor) -> ExposureReport {
        let mut report = ExposureReport::default();
        let traits = actor.traits();
        if traits.contains(ActorTraits::DIGGER) {
            return report;
        }

        let p = actor.position();
        let registry = std::sync::Arc::clone(self.map.registry());
        let mut slot = 0;
        while slot < self.map.slot_count(p) {
            let index = slot;
            slot += 1;
            let Some(entry) = self.map.slot(p, index) else {
                break;
            };
            if !entry.is_alive() {
                continue;
            }
            let Some(params) = registry.get(entry.type_id()) else {
                continue;
            };
            if entry.age().is_zero() && !params.immediate_exposure {
                continue;
            }

            let mut hit = Hit::new(&mut *actor, traits);
            let remaining = hit.resolve(params.exposure, entry.intensity(), self.rng);
            if hit.applied {
                report.effects_applied += 1;
                report.damage_dealt += hit.damage;
                trace!(field = %params.name, damage = hit.damage, "actor exposed");
            }
            if let Some(intensity) = remaining {
                if let Some(stored) = self.map.slot_mut(p, index) {
                    stored.set_intensity(intensity);
                    if !stored.is_alive() {
                        report.fields_consumed += 1;
                    }
                }
            }
        }
        if report.fields_consumed > 0 {
            self.map.compact_tile(p);
        }
        report
    }
}

// =============================================================================
// Resolution of a single entry
// =============================================================================

/// Accumulates what one entry did to the actor.
struct Hit<'x, 'a> {
    actor: &'x mut (dyn Actor + 'a),
    traits: ActorTraits,
    applied: bool,
    damage: i32,
}

impl<'x, 'a> Hit<'x, 'a> {
    fn new(actor: &'x mut (dyn Actor + 'a), traits: ActorTraits) -> Self {
        Self {
            actor,
            traits,
            applied: false,
            damage: 0,
        }
    }

    fn has(&self, flags: ActorTraits) -> bool {
        self.traits.intersects(flags)
    }

    fn hurt(&mut self, kind: DamageKind, amount: i32) {
        if amount > 0 {
            self.damage += self.actor.apply_damage(kind, amount);
            self.applied = true;
        }
    }

    fn afflict(&mut self, effect: StatusEffect, duration: TimeDuration, magnitude: i32) {
        self.actor.apply_status_effect(effect, duration, magnitude);
        self.applied = true;
    }

    /// Resolve one entry. Returns the entry's new intensity when the actor
    /// used some of it up.
    #[allow(clippy::too_many_lines)]
    fn resolve(&mut self, kind: ExposureKind, intensity: i32, rng: &mut SimRng) -> Option<i32> {
        let occupancy = self.actor.vehicle_occupancy();
        let inside = occupancy == VehicleOccupancy::Inside;
        let in_vehicle = occupancy != VehicleOccupancy::None;
        let breathless = self.has(ActorTraits::NO_BREATHE | ActorTraits::GAS_PROOF);

        match kind {
            ExposureKind::None => None,

            ExposureKind::Web => {
                if self.has(ActorTraits::WEB_WALKER) {
                    return None;
                }
                if !in_vehicle {
                    self.afflict(StatusEffect::Webbed, TimeDuration::TURN, intensity);
                }
                self.applied = true;
                Some(0)
            }

            ExposureKind::Sap => {
                if in_vehicle {
                    return None;
                }
                self.afflict(
                    StatusEffect::Sap,
                    TimeDuration::turns(i64::from(intensity) * 2),
                    intensity,
                );
                Some(intensity - 1)
            }

            ExposureKind::Sludge => {
                if in_vehicle || self.has(ActorTraits::FLYER | ActorTraits::SLUDGE_PROOF) {
                    return None;
                }
                self.actor.spend_moves(intensity * 300);
                self.applied = true;
                Some(0)
            }

            ExposureKind::Acid => {
                if in_vehicle || self.has(ActorTraits::ACID_PROOF | ActorTraits::FLYER) {
                    return None;
                }
                let mut burn = |scale: i32| rng.range(1, scale + intensity);
                // Feet and legs, then hands, torso and head when lying down.
                let mut total = burn(2) + burn(2);
                if intensity > 1 {
                    total += burn(0) + burn(0);
                }
                if self.actor.is_on_ground() {
                    total += burn(2) + burn(2) + burn(2) + burn(1);
                }
                self.hurt(DamageKind::Acid, total);
                let lasting = rng.range(2, intensity + 3);
                self.afflict(
                    StatusEffect::Corroding,
                    TimeDuration::turns(i64::from(lasting)),
                    intensity,
                );
                None
            }

            ExposureKind::Fire => {
                if self.has(ActorTraits::HEAT_IMMUNE) {
                    return None;
                }
                let adjusted = match occupancy {
                    VehicleOccupancy::Inside => intensity - 2,
                    VehicleOccupancy::Exposed => intensity - 1,
                    VehicleOccupancy::None => intensity,
                };
                if adjusted < 1 {
                    return None;
                }
                let parts = if self.actor.is_on_ground() {
                    11
                } else {
                    match adjusted {
                        1 => 4,
                        2 => 5,
                        _ => 9,
                    }
                };
                let mut total: i32 = (0..parts)
                    .map(|_| rng.range(adjusted, adjusted * 3 + 3))
                    .sum();
                if self.has(ActorTraits::HEAT_RESISTANT) {
                    total /= 2;
                }
                self.hurt(DamageKind::Heat, total);
                if adjusted >= 2 && !self.has(ActorTraits::FLYER) {
                    let burning = rng.range(adjusted, adjusted * 3);
                    self.afflict(
                        StatusEffect::OnFire,
                        TimeDuration::turns(i64::from(burning)),
                        adjusted,
                    );
                }
                None
            }

            ExposureKind::FlameBurst => {
                if inside || self.has(ActorTraits::HEAT_IMMUNE) {
                    return None;
                }
                let total: i32 = (0..3).map(|_| rng.range(2, 6)).sum();
                self.hurt(DamageKind::Heat, total);
                None
            }

            ExposureKind::Smoke => {
                if inside || breathless {
                    return None;
                }
                let (strength, turns) = match intensity {
                    i32::MIN..=1 => (1, 2),
                    2 => (2, 7),
                    _ => (4, 15),
                };
                self.afflict(StatusEffect::Smoke, TimeDuration::turns(turns), strength);
                None
            }

            ExposureKind::TearGas => {
                if breathless {
                    return None;
                }
                if (intensity > 1 || !rng.one_in(3)) && (!inside || rng.one_in(3)) {
                    self.afflict(StatusEffect::TearGas, TimeDuration::turns(20), 5);
                }
                if intensity > 1 && (!inside || rng.one_in(3)) {
                    self.afflict(StatusEffect::Blind, TimeDuration::turns(10), intensity * 2);
                }
                None
            }

            ExposureKind::RelaxGas => {
                if breathless {
                    return None;
                }
                if (intensity > 1 || !rng.one_in(3)) && (!inside || rng.one_in(3)) {
                    self.afflict(StatusEffect::Relaxed, TimeDuration::turns(3), intensity * 2);
                }
                None
            }

            ExposureKind::ToxicGas => {
                if breathless {
                    return None;
                }
                match (intensity.min(3), inside) {
                    (3, false) => {
                        self.afflict(StatusEffect::BadPoison, TimeDuration::minutes(3), 5);
                    }
                    (2, false) | (3, true) => {
                        self.afflict(StatusEffect::Poison, TimeDuration::minutes(3), 5);
                    }
                    (1, false) => {
                        self.afflict(StatusEffect::Poison, TimeDuration::minutes(2), 2);
                    }
                    _ => {}
                }
                None
            }

            ExposureKind::NukeGas => {
                if self.has(ActorTraits::RADIATION_PROOF) {
                    return None;
                }
                let dose = rng.range(intensity, intensity * (intensity + 1));
                self.hurt(DamageKind::Radiation, dose);
                if intensity >= 3 && !inside {
                    let searing = rng.range(1, 3);
                    self.hurt(DamageKind::Pure, searing);
                }
                None
            }

            ExposureKind::FungalHaze => {
                if breathless || self.has(ActorTraits::FUNGUS_IMMUNE | ActorTraits::FUNGAL) {
                    return None;
                }
                if !inside || rng.one_in(4) {
                    self.afflict(StatusEffect::Fungus, TimeDuration::minutes(10), 4);
                }
                None
            }

            ExposureKind::Fungicidal => {
                if inside || self.has(ActorTraits::GAS_PROOF) {
                    return None;
                }
                let lasting = TimeDuration::minutes(i64::from(intensity));
                if self.has(ActorTraits::FUNGAL) {
                    let withering = rng.range(intensity, intensity * 2);
                    self.hurt(DamageKind::Pure, withering);
                    self.afflict(StatusEffect::BadPoison, lasting, 5);
                } else if !self.has(ActorTraits::NO_BREATHE) {
                    self.afflict(StatusEffect::Poison, lasting, intensity);
                }
                None
            }

            ExposureKind::Dazzling => {
                if intensity > 1 || rng.one_in(5) {
                    self.afflict(StatusEffect::Blind, TimeDuration::turns(10), 10);
                } else {
                    self.afflict(StatusEffect::Blind, TimeDuration::turns(2), 2);
                }
                None
            }

            ExposureKind::Electricity => {
                if self.has(ActorTraits::ELECTRIC_IMMUNE) {
                    return None;
                }
                let total: i32 = (0..6).map(|_| rng.range(1, intensity)).sum();
                self.hurt(DamageKind::Electric, total);
                None
            }

            ExposureKind::Fatigue => {
                if rng.range(0, 2) < intensity {
                    self.hurt(DamageKind::Pure, intensity);
                    self.afflict(StatusEffect::Teleported, TimeDuration::TURN, intensity);
                }
                None
            }

            ExposureKind::VentShutdown => {
                self.applied = true;
                Some(0)
            }

            ExposureKind::Bees => {
                if self.has(ActorTraits::UNDERWATER) {
                    return None;
                }
                let stings = (0..8).filter(|_| rng.one_in(4)).count();
                if stings > 0 {
                    let stings = i32::try_from(stings).unwrap_or(8);
                    self.afflict(
                        StatusEffect::Stung,
                        TimeDuration::minutes(i64::from(stings)),
                        intensity * stings,
                    );
                }
                None
            }

            ExposureKind::Incendiary => {
                if self.has(ActorTraits::HEAT_IMMUNE) {
                    return None;
                }
                if self.has(ActorTraits::HEAT_RESISTANT) || intensity == 1 {
                    let scorch = rng.range(1, 3);
                    self.hurt(DamageKind::Heat, scorch);
                } else {
                    self.afflict(StatusEffect::OnFire, TimeDuration::turns(8), 1);
                    let scorch = rng.range(2, 6);
                    self.hurt(DamageKind::Heat, scorch);
                }
                None
            }
        }
    }
}
