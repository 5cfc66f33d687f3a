use rigid2d::facade;

fn main() {
    facade::create_world(0.0, -9.81);

    // Two static circles to cast a ray across, per the engine's raycast scenario.
    facade::create_body(0, 0, 1.0, 0.0, 3.0, 0.0, 1.0, 0.3, 0.5, 1, 0xFFFF);
    facade::create_body(0, 0, 1.0, 0.0, 7.0, 0.0, 1.0, 0.3, 0.5, 1, 0xFFFF);

    let hit = facade::raycast(0.0, 0.0, 1.0, 0.0, 10.0);
    if hit.is_empty() {
        println!("Ray hit nothing");
    } else {
        println!(
            "Ray hit body {} at ({:.3}, {:.3}), distance {:.3}",
            hit[0], hit[1], hit[2], hit[3]
        );
    }

    facade::destroy_world();
}
