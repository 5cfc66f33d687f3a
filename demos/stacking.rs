use rigid2d::facade;

fn main() {
    facade::create_world(0.0, -9.81);

    // Wide static floor.
    facade::create_body(0, 1, 25.0, 0.5, 0.0, -0.5, 1.0, 0.1, 0.5, 1, 0xFFFF);

    // Five boxes stacked directly on top of each other.
    let mut ids = Vec::new();
    for i in 0..5 {
        let id = facade::create_body(1, 1, 0.5, 0.5, 0.0, i as f64 + 0.5, 1.0, 0.1, 0.5, 1, 0xFFFF);
        ids.push(id);
    }

    for _ in 0..120 {
        facade::step(1.0 / 60.0);
    }

    for (i, id) in ids.iter().enumerate() {
        let state = facade::get_body_state(*id);
        println!("box {i}: y = {:.4}, sleeping = {}", state[1], state[6] != 0.0);
    }

    facade::destroy_world();
}
