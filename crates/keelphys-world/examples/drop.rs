//! Drops a handful of seeded-random cubes onto a floor and reports how the
//! pile settles. Run with `RUST_LOG=debug` for per-tick pipeline output.

use keelphys_core::{vec3, XorShift64};
use keelphys_dynamics::BodyDesc;
use keelphys_viz::DebugSettings;
use keelphys_world::{unit_cube_at, FixedTimestep, World, FIXED_DT};

fn main() {
    env_logger::init();

    let mut world = World::builder()
        .debug(DebugSettings { print_every: 60, ..DebugSettings::default() })
        .body_capacity(16)
        .build();
    world.add_body(BodyDesc::static_box(vec3(0.0, -1.0, 0.0), vec3(40.0, 1.0, 40.0)));

    // Seeded spawns: same seed, same pile.
    let mut rng = XorShift64::new(0xC0FFEE);
    let mut cubes = Vec::new();
    for i in 0..8 {
        let x = rng.range(-2.0, 2.0);
        let z = rng.range(-2.0, 2.0);
        let y = 3.0 + i as f32 * 1.4;
        cubes.push(world.add_body(unit_cube_at(vec3(x, y, z))));
    }

    // Ten simulated seconds at 62.5 Hz.
    let mut stepper = FixedTimestep::new(FIXED_DT);
    let mut ticks = 0u32;
    while ticks < 625 {
        ticks += stepper.advance(FIXED_DT, |dt| {
            world.step_subdivided(dt);
        });
    }

    let asleep = cubes.iter().filter(|c| world.bodies().is_sleeping(c.0)).count();
    println!("simulated {:.2}s in {} ticks", world.sim_time(), world.tick());
    println!("{asleep}/{} cubes asleep", cubes.len());
    for c in &cubes {
        let p = world.bodies().pose(c.0).pos;
        println!("  cube {}: ({:+.2}, {:+.2}, {:+.2})", c, p.x, p.y, p.z);
    }
}
