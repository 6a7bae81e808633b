use std::collections::HashMap;
use std::sync::Arc;

use scene3d_engine::camera::{
    Camera, CameraControls, DeprojectTarget, OrthographicCamera, PaintOrder, PerspectiveCamera, ProjectedElement,
    ViewRect,
};
use scene3d_engine::geom::{NormalizedVec3, Point2, Point3, Transform, Vec3};
use scene3d_engine::material::{ColourMaterial, Material};
use scene3d_engine::render::resample::resample;
use scene3d_engine::render::{RenderOptions, VectorRenderer};
use scene3d_engine::scene::{Element, LineElement, PointElement, Scene};
use scene3d_engine::surface::Colour;

fn assert_point_close(actual: Point3, expected: Point3, tol: f64) {
    assert!(
        actual.distance_to(expected) <= tol,
        "expected {expected:?}, got {actual:?}"
    );
}

fn flat(colour: Colour) -> Vec<Arc<dyn Material>> {
    vec![Arc::new(ColourMaterial::new(colour))]
}

fn corner_camera() -> PerspectiveCamera {
    PerspectiveCamera::new(Point3::new(-10.0, -10.0, -10.0), Vec3::new(1.0, 1.0, 1.0), 5.0)
        .expect("valid camera")
        .with_view(ViewRect::centered(20.0, 20.0))
        .expect("valid view")
}

fn cameras() -> Vec<Box<dyn Camera>> {
    let mut tilted = PerspectiveCamera::new(Point3::new(3.0, 2.0, -9.0), Vec3::new(-0.3, -0.2, 1.0), 4.0)
        .expect("valid camera")
        .with_scale(1.7)
        .expect("valid scale");
    tilted.orbit(0.3, -0.2).expect("orbit");
    vec![
        Box::new(corner_camera()),
        Box::new(tilted),
        Box::new(
            OrthographicCamera::new(Point3::new(0.0, 5.0, -5.0), Vec3::new(0.0, -1.0, 1.0))
                .expect("valid camera")
                .with_scale(2.0)
                .expect("valid scale"),
        ),
    ]
}

#[test]
fn deprojection_inverts_projection_on_the_target() {
    let vertices = [
        Point3::new(-1.0, -0.5, 0.5),
        Point3::new(0.5, 1.5, 1.0),
        Point3::new(1.5, -1.0, 2.0),
    ];
    let triangle = DeprojectTarget::Triangle { vertices };
    let line = DeprojectTarget::Line {
        start: vertices[0],
        end: vertices[2],
    };
    for camera in cameras() {
        for w in [[1.0, 1.0, 1.0], [0.7, 0.2, 0.1], [0.1, 0.1, 0.8]] {
            let total: f64 = w.iter().sum();
            let p = Point3::new(
                (w[0] * vertices[0].x + w[1] * vertices[1].x + w[2] * vertices[2].x) / total,
                (w[0] * vertices[0].y + w[1] * vertices[1].y + w[2] * vertices[2].y) / total,
                (w[0] * vertices[0].z + w[1] * vertices[1].z + w[2] * vertices[2].z) / total,
            );
            assert_point_close(camera.deproject(camera.project(p), &triangle), p, 1e-9);
        }
        let on_line = vertices[0].lerp(vertices[2], 0.3);
        assert_point_close(camera.deproject(camera.project(on_line), &line), on_line, 1e-9);
    }
}

#[test]
fn plane_origin_projects_to_screen_origin() {
    let camera = corner_camera();
    let p = camera.project(camera.plane_origin());
    assert!(p.x.abs() < 1e-12 && p.y.abs() < 1e-12, "{p:?}");
}

#[test]
fn depth_grows_along_the_view_direction() {
    for camera in cameras() {
        let base = camera.view_point();
        let d = Point3::ORIGIN - base;
        let near = base + d * 0.5;
        let far = base + d * 1.5;
        assert!(camera.z_depth(far) > camera.z_depth(near));
    }
}

#[test]
fn culling_rejects_hidden_and_degenerate_elements() {
    let camera = corner_camera();
    let behind = Element::from(PointElement::new(Point3::new(-20.0, -20.0, -20.0), Colour::BLACK, 1.0));
    let visible = Element::from(PointElement::new(Point3::ORIGIN, Colour::BLACK, 1.0));
    let dot = Point3::new(1.0, 2.0, 3.0);
    let zero_line = Element::from(LineElement::new(dot, dot, Colour::BLACK, 1.0));
    assert!(camera.is_culled(&behind));
    assert!(!camera.is_culled(&visible));
    assert!(camera.is_culled(&zero_line));
}

#[test]
fn cube_seen_from_a_corner_paints_its_three_near_faces() {
    let mut scene = Scene::new();
    let cube = scene.add_cube(Point3::ORIGIN, 2.0, flat(Colour::WHITE)).expect("cube");
    assert_eq!(cube.len(), 12);

    let camera = corner_camera();
    let (page, diagnostics) = VectorRenderer::default().render(&scene, &camera, &[]).expect("render");
    assert_eq!(diagnostics.culled_count, 6);
    assert_eq!(diagnostics.painted_count, 6);
    assert_eq!(page.commands().len(), 6);
    assert!(diagnostics.is_consistent());

    // The visible faces are the ones whose outward normal points at the camera.
    for index in &diagnostics.paint_order {
        let Element::Triangle(triangle) = &scene.elements()[*index] else {
            panic!("cube is made of triangles");
        };
        let n = triangle.normal().to_vec3();
        assert!(n.x + n.y + n.z < 0.0, "back face {index} painted");
    }
}

#[test]
fn cube_seen_head_on_paints_only_its_front_face() {
    let mut scene = Scene::new();
    scene.add_cube(Point3::ORIGIN, 1.0, flat(Colour::WHITE)).expect("cube");

    let camera = PerspectiveCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z, 5.0).expect("valid camera");
    let (page, diagnostics) = VectorRenderer::default().render(&scene, &camera, &[]).expect("render");
    assert_eq!(diagnostics.culled_count, 10);
    assert_eq!(diagnostics.painted_count, 2);
    assert_eq!(page.commands().len(), 2);

    for index in &diagnostics.paint_order {
        let Element::Triangle(triangle) = &scene.elements()[*index] else {
            panic!("cube is made of triangles");
        };
        let n = triangle.normal().to_vec3();
        assert!(n.x.abs() < 1e-12 && n.y.abs() < 1e-12, "{n:?}");
        assert!((n.z + 1.0).abs() < 1e-12, "{n:?}");
    }
}

#[test]
fn paint_order_satisfies_every_pairwise_comparison() {
    let mut scene = Scene::new();
    scene
        .add_sphere(Point3::new(0.5, 0.0, 1.0), 1.5, 5, 8, flat(Colour::WHITE))
        .expect("sphere");
    scene
        .add_cube(Point3::new(-1.5, 0.5, -0.5), 1.0, flat(Colour::BLACK))
        .expect("cube");
    scene
        .add_line(Point3::new(-3.0, -1.0, -2.0), Point3::new(3.0, 1.0, 2.0), Colour::BLACK, 0.05)
        .expect("line");

    for camera in cameras() {
        let (_, diagnostics) = VectorRenderer::default()
            .render(&scene, camera.as_ref(), &[])
            .expect("render");
        if !diagnostics.is_consistent() {
            continue;
        }
        let position: HashMap<usize, usize> = diagnostics
            .paint_order
            .iter()
            .enumerate()
            .map(|(pos, &index)| (index, pos))
            .collect();
        assert_eq!(position.len(), diagnostics.paint_order.len(), "indices repeat");

        let outlines: HashMap<usize, Vec<Point2>> = position
            .keys()
            .map(|&i| {
                let outline = scene.elements()[i].vertices().iter().map(|p| camera.project(*p)).collect();
                (i, outline)
            })
            .collect();
        for (&a, outline_a) in &outlines {
            for (&b, outline_b) in &outlines {
                if a >= b {
                    continue;
                }
                let order = camera.compare(
                    &ProjectedElement {
                        element: &scene.elements()[a],
                        outline: outline_a,
                    },
                    &ProjectedElement {
                        element: &scene.elements()[b],
                        outline: outline_b,
                    },
                );
                match order {
                    PaintOrder::Before => assert!(position[&a] < position[&b], "{a} must precede {b}"),
                    PaintOrder::After => assert!(position[&b] < position[&a], "{b} must precede {a}"),
                    PaintOrder::Unordered => {}
                }
            }
        }
    }
}

#[test]
fn comparison_is_antisymmetric() {
    let mut scene = Scene::new();
    scene
        .add_sphere(Point3::ORIGIN, 1.0, 4, 6, flat(Colour::WHITE))
        .expect("sphere");
    let camera = corner_camera();
    let visible: Vec<(&Element, Vec<Point2>)> = scene
        .elements()
        .iter()
        .filter(|e| !camera.is_culled(e))
        .map(|e| (e, e.vertices().iter().map(|p| camera.project(*p)).collect()))
        .collect();
    for (a, outline_a) in &visible {
        for (b, outline_b) in &visible {
            let pa = ProjectedElement {
                element: a,
                outline: outline_a,
            };
            let pb = ProjectedElement {
                element: b,
                outline: outline_b,
            };
            assert_eq!(camera.compare(&pa, &pb), camera.compare(&pb, &pa).reverse());
        }
    }
}

#[test]
fn resampled_pieces_respect_the_size_bound() {
    let camera = corner_camera();
    let line = Element::from(LineElement::new(
        Point3::new(-3.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 4.0),
        Colour::BLACK,
        1.0,
    ));
    let pieces = resample(&line, &camera, 0.05, 12);
    assert!(pieces.len() > 1);
    for piece in &pieces {
        let v = piece.vertices();
        let (a, b) = (camera.project(v[0]), camera.project(v[1]));
        assert!(a.distance_squared_to(b) <= 0.05);
    }
    // Pieces chain from start to end.
    assert_point_close(pieces[0].vertices()[0], Point3::new(-3.0, 0.0, 0.0), 1e-12);
    assert_point_close(pieces[pieces.len() - 1].vertices()[1], Point3::new(3.0, 0.0, 4.0), 1e-12);
}

#[test]
fn renders_are_repeatable_and_share_the_scene() {
    let mut scene = Scene::new();
    scene
        .add_sphere(Point3::ORIGIN, 1.5, 6, 12, flat(Colour::WHITE))
        .expect("sphere");
    let renderer = VectorRenderer::new(RenderOptions {
        resampling_max_size: Some(0.5),
        ..RenderOptions::default()
    })
    .expect("options");
    let camera = corner_camera();
    let (first_page, first) = renderer.render(&scene, &camera, &[]).expect("render");

    let (second_page, second) = std::thread::scope(|s| {
        s.spawn(|| renderer.render(&scene, &camera, &[]).expect("render"))
            .join()
            .expect("thread")
    });
    assert_eq!(first_page, second_page);
    assert_eq!(first.paint_order, second.paint_order);
}

#[test]
fn scene_transform_moves_rendered_output() {
    let mut scene = Scene::new();
    let index = scene
        .add_point(Point3::ORIGIN, Colour::BLACK, 0.2)
        .expect("point");
    let camera = corner_camera();
    let renderer = VectorRenderer::default();

    renderer.render(&scene, &camera, &[]).expect("render");
    let before = scene.cached_projection(index).expect("projected")[0];

    let axis = NormalizedVec3::new(Vec3::Z).expect("axis");
    scene
        .transform(&(Transform::translate(Vec3::new(1.0, 0.0, 0.0)) * Transform::rotate(axis, 0.5)))
        .expect("transform");
    renderer.render(&scene, &camera, &[]).expect("render");
    let after = scene.cached_projection(index).expect("projected")[0];
    assert!(before.distance_squared_to(after) > 1e-6);
}
