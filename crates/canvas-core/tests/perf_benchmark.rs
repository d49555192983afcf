use canvas_core::binding::{self, BindingContext, update_bound_elements};
use canvas_core::kurbo::Point;
use canvas_core::{ArrowEnd, Element, ElementUpdate, Scene};
use std::time::Instant;

#[test]
#[ignore] // Run manually with `cargo test --test perf_benchmark -- --nocapture --ignored`
fn benchmark_binding_maintenance() {
    let mut scene = Scene::new();
    // 5,000 boxes in a chain, each linked to the next by a bound arrow
    let mut boxes = Vec::new();
    for i in 0..5_000 {
        let x = (i % 100) as f64 * 150.0;
        let y = (i / 100) as f64 * 100.0;
        boxes.push(scene.insert(Element::rectangle(x, y, 100.0, 50.0)).id);
    }
    for pair in boxes.windows(2) {
        let from = scene.get(pair[0]).unwrap().center();
        let to = scene.get(pair[1]).unwrap().center();
        let points = vec![Point::ZERO, (to - from).to_point()];
        let arrow = scene.insert(Element::arrow(from.x, from.y, points));
        binding::bind_arrow(&mut scene, arrow.id, ArrowEnd::Start, pair[0], 5.0).unwrap();
        binding::bind_arrow(&mut scene, arrow.id, ArrowEnd::End, pair[1], 5.0).unwrap();
    }
    scene.drain_changes();

    let hub = boxes[2_500];
    let start = Instant::now();
    for step in 0..1_000 {
        let dx = (step % 50) as f64;
        scene.mutate(hub, ElementUpdate::position(dx, 2_500.0));
        update_bound_elements(&mut scene, &[hub], &BindingContext::with_batch([hub]));
    }
    let duration = start.elapsed();
    let changes = scene.drain_changes().len();

    println!("1,000 bound moves over 10,000 elements in {:?} ({changes} changes)", duration);
}
