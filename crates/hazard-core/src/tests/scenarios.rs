//! End-to-end scenarios through the engine's public operations.

use miasma::{TimeDuration, Tripoint, EIGHT_NEIGHBORS};

use crate::engine::HazardEngine;
use crate::world::{StatusEffect, TerrainFlags};

use super::helpers::{
    flat_engine, pt, run_ticks, small_flat_config, standard_registry, total_intensity,
    tuned_registry, TestActor, TestWorld,
};

// =============================================================================
// Fire burning out
// =============================================================================

#[test]
fn test_lone_fire_burns_out_its_fuel() {
    let mut engine = flat_engine(11);
    let fire = engine.registry().known().fire;
    let p = pt(10, 10);

    let mut world = TestWorld::calm();
    world.objects.piles.insert(p, 1);

    assert!(engine.add_field(p, fire, 1, TimeDuration::ZERO));

    let mut ticks = 0;
    while engine.field_at(p, fire).is_some() && ticks < 5_000 {
        engine.advance_tick(&mut world.view());
        ticks += 1;
    }

    assert!(engine.field_at(p, fire).is_none(), "fire still alive after {ticks} ticks");
    assert_eq!(world.objects.burnt, 1);
    // Compaction leaves no dead slots behind.
    let cell = engine.map().cell(p);
    assert_eq!(
        cell.map_or(0, |c| c.slot_count()),
        cell.map_or(0, |c| c.live_count())
    );
}

#[test]
fn test_fire_on_flammable_floor_eventually_burns_it_out() {
    let mut engine = flat_engine(3);
    let fire = engine.registry().known().fire;
    let p = pt(6, 6);

    let mut world = TestWorld::calm();
    world.terrain.set(p, TerrainFlags::FLAMMABLE);
    engine.add_field(p, fire, 1, TimeDuration::ZERO);

    let mut ticks = 0;
    while engine.field_at(p, fire).is_some() && ticks < 20_000 {
        engine.advance_tick(&mut world.view());
        ticks += 1;
    }

    assert!(world.terrain.burnt.contains(&p));
    assert!(engine.field_at(p, fire).is_none());
}

// =============================================================================
// Gas spreading
// =============================================================================

#[test]
fn test_gas_reaches_a_neighbor_in_enclosed_room() {
    let registry = standard_registry();
    let gas = registry.id("fd_cigsmoke").expect("bundled type");
    let mut engine = HazardEngine::new_with_seed(small_flat_config(), registry, 5);

    // 5x5 room at (2..=6, 2..=6), walled in.
    let mut world = TestWorld::calm();
    for i in 1..=7 {
        world.terrain.wall(pt(i, 1));
        world.terrain.wall(pt(i, 7));
        world.terrain.wall(pt(1, i));
        world.terrain.wall(pt(7, i));
    }
    let center = pt(4, 4);
    engine.add_field(center, gas, 3, TimeDuration::ZERO);

    let neighbors: Vec<Tripoint> = EIGHT_NEIGHBORS.iter().map(|&o| center + o).collect();
    let mut spread = false;
    for _ in 0..20 {
        engine.advance_tick(&mut world.view());
        if neighbors.iter().any(|&n| engine.field_at(n, gas).is_some()) {
            spread = true;
            break;
        }
    }
    assert!(spread);

    // Nothing leaks past the walls.
    for (p, entry) in engine.map().live_entries() {
        if entry.type_id() == gas {
            assert!((2..=6).contains(&p.x) && (2..=6).contains(&p.y), "gas at {p}");
        }
    }
}

#[test]
fn test_single_unit_gas_stays_put() {
    let registry = standard_registry();
    let gas = registry.id("fd_cigsmoke").expect("bundled type");
    let mut engine = HazardEngine::new_with_seed(small_flat_config(), registry, 8);
    let mut world = TestWorld::calm();
    let p = pt(9, 9);
    engine.add_field(p, gas, 1, TimeDuration::turns(1));

    run_ticks(&mut engine, &mut world, 5);

    assert_eq!(total_intensity(&engine, gas), 1);
    assert!(engine.field_at(p, gas).is_some());
}

// =============================================================================
// Fire growth
// =============================================================================

#[test]
fn test_fire_cluster_grows() {
    let mut engine = flat_engine(21);
    let fire = engine.registry().known().fire;
    let mut world = TestWorld::calm();
    world.terrain.default_flags = TerrainFlags::FLAMMABLE;

    let big = pt(5, 5);
    let small = [pt(6, 5), pt(5, 6), pt(6, 6)];
    engine.add_field(big, fire, 3, TimeDuration::ZERO);
    for &p in &small {
        engine.add_field(p, fire, 1, TimeDuration::ZERO);
    }

    let mut grew = false;
    for _ in 0..10 {
        engine.advance_tick(&mut world.view());
        if small
            .iter()
            .any(|&p| engine.field_at(p, fire).is_some_and(|e| e.intensity() >= 2))
        {
            grew = true;
            break;
        }
    }
    assert!(grew);
}

// =============================================================================
// Webs
// =============================================================================

#[test]
fn test_actor_tears_through_web() {
    let mut engine = flat_engine(1);
    let web = engine.registry().known().web;
    let p = pt(3, 3);
    engine.add_field(p, web, 2, TimeDuration::ZERO);

    let mut actor = TestActor::at(p);
    let report = engine.expose_actor(&mut actor);

    assert!(engine.field_at(p, web).is_none());
    assert_eq!(report.fields_consumed, 1);
    assert!(actor.has_effect(StatusEffect::Webbed));

    // Nothing left to hit on a second call.
    let again = engine.expose_actor(&mut actor);
    assert_eq!(again.effects_applied, 0);
    assert_eq!(actor.effects.len(), 1);
}

// =============================================================================
// Electricity grounding
// =============================================================================

#[test]
fn test_grounded_charge_is_conserved() {
    let registry = tuned_registry(|def| {
        if def.id == "fd_electricity" {
            def.half_life = TimeDuration::ZERO;
        }
    });
    let electricity = registry.known().electricity;
    let p = pt(8, 8);
    let area: Vec<Tripoint> = std::iter::once(p)
        .chain(EIGHT_NEIGHBORS.iter().map(|&o| p + o))
        .collect();

    for seed in 0..20 {
        let mut engine =
            HazardEngine::new_with_seed(small_flat_config(), registry.clone(), seed);
        let mut world = TestWorld::calm();
        world.terrain.wall(p);
        engine.add_field(p, electricity, 2, TimeDuration::TURN);

        engine.advance_tick(&mut world.view());

        let total: i32 = area
            .iter()
            .filter_map(|&t| engine.field_at(t, electricity))
            .map(|e| e.intensity())
            .sum();
        assert_eq!(total, 2, "seed {seed}");
        assert_eq!(total_intensity(&engine, electricity), 2, "seed {seed}");
    }
}
