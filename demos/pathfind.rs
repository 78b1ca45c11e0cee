use bayou::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{ "length": 24, "thickness": 12, "tiling": 32 }"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_target(false)
        .init();

    let cfg = match NavMeshConfig::from_json(CONFIG) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("bad navmesh config: {e}");
            return;
        }
    };
    let mut mesh = match NavMesh::try_with_config(cfg) {
        Ok(mesh) => mesh,
        Err(e) => {
            error!("cannot build navmesh: {e}");
            return;
        }
    };

    // A wall down the middle with a gap near the bottom, tracked through the world.
    let mut world = World::default();
    for j in 0..9 {
        let pos = Vector3::new(12.0 * 32.0, j as f32 * 32.0, 0.0);
        let id = world.push(Entity::barrier(RigidBody::new(pos, Vector3::new(20.0, 20.0, 64.0)).with_static(true)));
        if let Some(e) = world.get(id) {
            mesh.insert_object(id, &e.body());
        }
    }
    mesh.refresh(&world);

    let start = Vector3::new(2.0 * 32.0, 2.0 * 32.0, 0.0);
    let goal = Vector3::new(21.0 * 32.0, 3.0 * 32.0, 0.0);
    let path = mesh.calc_path(start, goal);
    info!(waypoints = path.len(), "path found");

    let (length, thickness) = mesh.dims();
    let on_path: Vec<(i32, i32)> = path.iter().map(|p| mesh.indices_of(*p)).collect();
    let (si, sj) = mesh.indices_of(start);
    let (gi, gj) = mesh.indices_of(goal);
    for j in 0..thickness as i32 {
        let row: String = (0..length as i32)
            .map(|i| {
                if (i, j) == (si, sj) {
                    'S'
                } else if (i, j) == (gi, gj) {
                    'G'
                } else if mesh.is_occupied(i, j) {
                    '#'
                } else if on_path.contains(&(i, j)) {
                    '*'
                } else {
                    '.'
                }
            })
            .collect();
        println!("{row}");
    }
}
