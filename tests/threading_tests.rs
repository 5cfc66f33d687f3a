//! Thread-safety of the façade's process-wide world. `PhysicsWorld` itself
//! is single-threaded by design; the façade is what a multi-threaded host
//! actually touches, so that is what these tests hold to.

use rigid2d::facade;
use std::sync::{Arc, Barrier};
use std::thread;

fn assert_sync_send<T: Sync + Send>() {}

#[test]
fn physics_world_is_sync_and_send() {
    assert_sync_send::<rigid2d::PhysicsWorld>();
}

#[test]
fn facade_step_is_safe_to_call_from_multiple_threads() {
    facade::destroy_world();
    facade::create_world(0.0, -9.81);
    let body_id = facade::create_body(1, 0, 0.5, 0.0, 0.0, 5.0, 1.0, 0.3, 0.5, 1, 0xFFFF);
    assert!(body_id > 0.0);

    let barrier = Arc::new(Barrier::new(4));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            facade::step(1.0 / 60.0);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let state = facade::get_body_state(body_id);
    assert!(state[1] < 5.0, "body should have fallen after four steps");

    facade::destroy_world();
}
