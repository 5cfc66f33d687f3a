use rigid2d::facade;

fn main() {
    facade::create_world(0.0, -9.81);

    // Static ground: a wide AABB at y = -0.5.
    facade::create_body(0, 1, 50.0, 0.5, 0.0, -0.5, 1.0, 0.3, 0.5, 1, 0xFFFF);

    // A dynamic circle dropped from y = 1.0.
    let body_id = facade::create_body(1, 0, 0.5, 0.0, 0.0, 1.0, 1.0, 0.3, 0.5, 1, 0xFFFF);

    facade::step(1.0 / 60.0);

    let state = facade::get_body_state(body_id);
    println!("Body position after one step: ({:.6}, {:.6})", state[0], state[1]);

    facade::destroy_world();
}
