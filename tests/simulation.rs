//! Whole-frame behaviour through the public API.

use debris::game::collision::AtomGroup;
use debris::game::scene::materials;
use debris::game::{HitTarget, Moid, MovableObject, Shape, SimWorld};
use debris::{ObjectKind, PresetRegistry, SimConfig, Vec2};

const BASE: &str = include_str!("../data/base.ron");

fn config() -> SimConfig {
    SimConfig {
        scene_width: 200,
        scene_height: 120,
        ..SimConfig::default()
    }
}

fn weightless() -> SimConfig {
    SimConfig {
        global_acceleration: Vec2::ZERO,
        settle_enabled: false,
        ..config()
    }
}

fn demo_world(config: SimConfig) -> SimWorld {
    let mut presets = PresetRegistry::new();
    presets.load_str(BASE).unwrap();
    let mut world = SimWorld::with_presets(config, presets);
    world.scene.fill_rect(0, 100, 200, 120, materials::SOIL);
    world.spawn("Actor", "Crab", None, Vec2::new(100.0, 85.0)).unwrap();
    for i in 0..4 {
        world.spawn("MOSRotating", "Crate", None, Vec2::new(40.0 + i as f32 * 12.0, 20.0)).unwrap();
    }
    world
}

fn collect<'a>(obj: &'a MovableObject, out: &mut Vec<&'a MovableObject>) {
    out.push(obj);
    for child in obj.children() {
        collect(child, out);
    }
}

fn bullet(world: &mut SimWorld, pos: Vec2, vel: Vec2) -> MovableObject {
    let mut b = MovableObject::new(ObjectKind::Pixel, world.next_id());
    b.pos = pos;
    b.vel = vel;
    b.set_collider(Box::new(AtomGroup::new(vec![Vec2::ZERO], materials::METAL)));
    b
}

fn target(world: &mut SimWorld, pos: Vec2) -> MovableObject {
    let mut t = MovableObject::new(ObjectKind::Actor, world.next_id());
    t.pos = pos;
    t.set_shape(Shape::Rect { half_w: 3.0, half_h: 3.0 });
    t
}

#[test]
fn test_every_object_has_a_unique_moid_after_registration() {
    let mut world = demo_world(config());
    for _ in 0..20 {
        world.step();

        let mut all = Vec::new();
        for (_, root) in world.movables.iter() {
            collect(root, &mut all);
        }
        let mut seen = std::collections::HashSet::new();
        for obj in &all {
            let moid = obj.moid();
            assert!(moid.get() >= 1 && moid.index() < world.moids.len());
            assert!(seen.insert(moid), "{} registered twice", moid);
            assert_eq!(world.moids.get(moid).unwrap().unique_id, obj.unique_id());
        }
        assert_eq!(all.len(), world.moids.len() - 1);

        for &pixel in world.id_buffer.raw() {
            assert!(pixel.index() < world.moids.len());
        }
    }
}

#[test]
fn test_crab_footprint_covers_its_parts() {
    let mut world = demo_world(config());
    world.step();
    let (_, crab) = world
        .movables
        .iter()
        .find(|(_, o)| o.kind() == ObjectKind::Actor)
        .unwrap();

    // body, mount, pistol, two legs, two feet
    assert_eq!(crab.tree_size(), 7);
    assert_eq!(crab.moid_footprint(), 7);
    for part in crab.children() {
        assert_eq!(part.root_moid(), crab.moid());
        assert!(crab.owns_moid(part.moid()));
    }
}

#[test]
fn test_lifetime_expires_in_post_travel() {
    let mut world = SimWorld::new(weightless());
    let mut obj = MovableObject::new(ObjectKind::Pixel, world.next_id());
    obj.pos = Vec2::new(50.0, 50.0);
    obj.set_lifetime_ms(110.0);
    let id = world.add(obj);

    world.run(6);
    assert!(world.movables.find(id).is_some());
    world.step();
    assert!(world.movables.find(id).is_none());
    assert_eq!(world.events.deleted.len(), 1);
}

#[test]
fn test_ignore_uid_suppresses_hits_on_the_shooter() {
    for ignore in [false, true] {
        let mut world = SimWorld::new(weightless());
        let shooter = target(&mut world, Vec2::new(50.0, 50.0));
        let shooter_id = world.add(shooter);
        let mut shot = bullet(&mut world, Vec2::new(50.0, 50.0), Vec2::new(120.0, 0.0));
        if ignore {
            shot.set_ignore_uid(Some(shooter_id));
        }
        world.add(shot);

        let mut hits = 0;
        for _ in 0..4 {
            hits += world.step().mo_hits;
        }
        assert_eq!(hits > 0, !ignore);
    }
}

#[test]
fn test_team_mates_pass_through_each_other() {
    let mut world = SimWorld::new(weightless());
    let mut friend = target(&mut world, Vec2::new(60.0, 50.0));
    friend.set_team(Some(2));
    world.add(friend);

    let mut shot = bullet(&mut world, Vec2::new(40.0, 50.0), Vec2::new(300.0, 0.0));
    shot.set_team(Some(2));
    shot.set_ignores_team_hits(true);
    world.add(shot);

    let total: usize = (0..5).map(|_| world.step().mo_hits).sum();
    assert_eq!(total, 0);
}

#[test]
fn test_pinned_object_never_moves_or_rests() {
    let mut world = SimWorld::new(config());
    let mut anchor = MovableObject::new(ObjectKind::Rotating, world.next_id());
    anchor.pos = Vec2::new(100.0, 30.0);
    anchor.set_pin_strength(1000.0);
    let id = world.add(anchor);

    world.step();
    world.movables.find_mut(id).unwrap().add_impulse(Vec2::new(500.0, 0.0), Vec2::ZERO);
    world.run(120);

    let anchor = world.movables.find(id).unwrap();
    assert_eq!(anchor.pos, Vec2::new(100.0, 30.0));
    assert_eq!(anchor.vel, Vec2::ZERO);
    assert!(!anchor.is_at_rest());
    assert!(anchor.impulses().is_empty());
}

#[test]
fn test_mission_critical_object_stays_simulated() {
    let mut world = SimWorld::new(config());
    world.scene.fill_rect(0, 100, 200, 120, materials::ROCK);
    let mut idol = MovableObject::new(ObjectKind::Rotating, world.next_id());
    idol.pos = Vec2::new(100.0, 96.0);
    idol.set_shape(Shape::Rect { half_w: 2.0, half_h: 2.0 });
    idol.set_collider(Box::new(AtomGroup::new(
        Shape::Rect { half_w: 2.0, half_h: 2.0 }.default_atoms(1.0),
        materials::METAL,
    )));
    idol.set_mission_critical(true);
    let id = world.add(idol);

    world.run(240);
    assert!(world.movables.find(id).is_some());
    assert!(world.events.settled.is_empty());
}

#[test]
fn test_same_seed_replays_identically() {
    let trace = || {
        let mut world = demo_world(config());
        let mut positions = Vec::new();
        for frame in 0..300 {
            if frame == 100 {
                let crate_id = world
                    .movables
                    .iter()
                    .find(|(_, o)| o.preset_name() == "Crate")
                    .map(|(_, o)| o.unique_id());
                if let Some(id) = crate_id {
                    world.movables.find_mut(id).unwrap().set_to_gib(true);
                }
            }
            world.step();
        }
        for (_, obj) in world.movables.iter() {
            positions.push((obj.unique_id(), obj.pos.x.to_bits(), obj.pos.y.to_bits()));
        }
        positions
    };
    assert_eq!(trace(), trace());
}

#[test]
fn test_registration_skips_untouchable_objects() {
    let mut world = SimWorld::new(weightless());
    let mut ghost = MovableObject::new(ObjectKind::Rotating, world.next_id());
    ghost.pos = Vec2::new(20.0, 20.0);
    ghost.set_gets_hit_by_mos(false);
    let id = world.add(ghost);

    let stats = world.step();
    assert_eq!(stats.moids, 0);
    assert_eq!(world.movables.find(id).unwrap().moid(), Moid::NONE);
    assert_eq!(world.id_buffer.get(20, 20), Moid::NONE);
}
