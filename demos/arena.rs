use bayou::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WIDTH: f32 = 1024.0;
const HEIGHT: f32 = 576.0;
const TILE: i32 = 32;

fn wall(pos: Vector3, dims: Vector3) -> Entity {
    let body = RigidBody::new(pos, dims)
        .with_mass(i32::MAX as f32)
        .with_restitution(0.2)
        .with_friction(0.7, 0.6)
        .with_static(true);
    Entity::barrier(body)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut world = World::new(WorldConfig { gravity: -0.82, enable_timing: true, ..Default::default() });

    let slab = Vector3::new(WIDTH, HEIGHT, HEIGHT);
    world.push(wall(Vector3::new(WIDTH / 2.0, HEIGHT / 2.0, -HEIGHT / 2.0), slab));
    world.push(wall(Vector3::new(WIDTH / 2.0, HEIGHT / 2.0, HEIGHT * 1.5), slab));
    world.push(wall(Vector3::new(-WIDTH / 2.0, HEIGHT / 2.0, HEIGHT / 2.0), slab));
    world.push(wall(Vector3::new(WIDTH * 1.5, HEIGHT / 2.0, HEIGHT / 2.0), slab));
    let south = world.push(wall(Vector3::new(WIDTH / 2.0, HEIGHT * 1.5 - 110.0, HEIGHT / 2.0), slab));
    let north = world.push(wall(Vector3::new(WIDTH / 2.0, -HEIGHT / 2.0 + 170.0, HEIGHT / 2.0), slab));

    let pillar_dims = Vector3::new(100.0, 200.0, HEIGHT / 2.0);
    let south_face = HEIGHT * 1.5 - 110.0 - HEIGHT / 2.0;
    let pillar = world.push(wall(
        Vector3::new(WIDTH / 2.0, south_face - pillar_dims.y / 2.0, HEIGHT / 4.0),
        pillar_dims,
    ));

    let mut mesh = NavMesh::new(0, 0, (WIDTH as i32 / TILE) as usize, (HEIGHT as i32 / TILE) as usize, TILE);
    for id in [pillar, north, south] {
        if let Some(e) = world.get(id) {
            mesh.insert_object(id, &e.body());
        }
    }

    let mut hero = Entity::character();
    hero.set_position(Vector3::new(100.0, HEIGHT / 2.0, 32.0));
    let hero = world.push(hero);

    let mut elf = Entity::character();
    elf.set_position(Vector3::new(WIDTH / 2.0 + 300.0, HEIGHT / 2.0, HEIGHT / 2.0));
    let elf = world.push(elf);

    let mut follower = PathFollower::default();

    for frame in 0..600u32 {
        // scripted input: walk east, hop every two seconds
        if let Some(h) = world.get_mut(hero) {
            let m = h.body().mass();
            h.apply_force(Vector3::new(m, 0.0, 0.0));
            if frame % 120 == 0 {
                h.apply_force(Vector3::new(0.0, 0.0, 25.0 * m));
            }
        }

        let target = world.get(hero).map(Entity::position);
        if let (Some(target), Some(e)) = (target, world.get(elf)) {
            let force = follower.steer(&mesh, &e.body(), target);
            if let Some(e) = world.get_mut(elf) {
                e.apply_force(force);
            }
        }

        world.tick();

        for ev in world.drain_events() {
            if ev.a_tag == EntityTag::Object && ev.b_tag == EntityTag::Object {
                info!(frame, a = ?ev.a, b = ?ev.b, "characters bumped");
            }
        }

        if frame % 60 == 0 {
            let draws = world.render_objects(1.0);
            let hp = world.get(hero).map(Entity::position).unwrap_or_default();
            let ep = world.get(elf).map(Entity::position).unwrap_or_default();
            info!(
                frame,
                hero = ?hp,
                elf = ?ep,
                waypoints = follower.remaining().len(),
                draw_calls = draws.len(),
                "arena"
            );
            if let Some(t) = world.timing() {
                info!(
                    "timing: tick={:.3}ms update={:.3}ms detect={:.3}ms resolve={:.3}ms clean={:.3}ms",
                    t.tick_ms, t.update_ms, t.detect_ms, t.resolve_ms, t.clean_ms
                );
            }
        }
    }
}
