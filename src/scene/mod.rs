//! Scene graph: an ordered list of elements plus the per-frame projection cache.

mod builders;
mod element;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::geom::{Point2, Transform};
use crate::render::RenderError;

pub use element::{Element, ElementKind, ElementMeta, LineElement, PointElement, TriangleElement};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("point coordinates must be finite")]
    NonFinitePoint,
    #[error("triangle vertices are collinear")]
    DegenerateTriangle,
    #[error("size must be positive and finite, got {size}")]
    InvalidSize { size: f64 },
    #[error("radius must be positive and finite, got {radius}")]
    InvalidRadius { radius: f64 },
    #[error("resolution must be at least {min}")]
    InvalidResolution { min: usize },
    #[error("at least {min} points are required")]
    NotEnoughPoints { min: usize },
    #[error("polygon has zero area")]
    DegeneratePolygon,
    #[error("triangulation failed: {0}")]
    Triangulation(String),
    #[error("direction vector is zero or not finite")]
    InvalidDirection,
    #[error("transform is not invertible")]
    SingularTransform,
}

/// Projections computed during the most recent render, indexed by element.
#[derive(Debug, Default)]
pub(crate) struct FrameCache {
    pub(crate) projections: Vec<Option<Vec<Point2>>>,
}

impl FrameCache {
    pub(crate) fn reset(&mut self, len: usize) {
        self.projections.clear();
        self.projections.resize(len, None);
    }
}

/// Elements in insertion order. The index returned by [`Scene::add`] (and the
/// builders) identifies an element for the lifetime of the scene.
///
/// A render takes the frame lock for its whole duration, so concurrent renders
/// of one scene run one after the other.
#[derive(Debug, Default)]
pub struct Scene {
    elements: Vec<Element>,
    frame: Mutex<FrameCache>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: impl Into<Element>) -> usize {
        self.elements.push(element.into());
        self.elements.len() - 1
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Removes every element and the cached projections. A frame lock left
    /// poisoned by a panicking render is recovered here.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.frame
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .projections
            .clear();
        self.frame.clear_poison();
    }

    /// Sets the hit-test tag of an element. Returns `false` for an unknown index.
    pub fn set_tag(&mut self, index: usize, tag: Option<String>) -> bool {
        match self.elements.get_mut(index) {
            Some(element) => {
                element.meta_mut().tag = tag;
                true
            }
            None => false,
        }
    }

    /// Applies `transform` to every element. On error the scene is left untouched.
    pub fn transform(&mut self, transform: &Transform) -> Result<(), SceneError> {
        let transformed = self
            .elements
            .iter()
            .map(|element| element.transformed(transform))
            .collect::<Result<Vec<_>, _>>()?;
        self.elements = transformed;
        Ok(())
    }

    /// The projected outline computed for `index` by the last render, if the
    /// element survived culling.
    #[must_use]
    pub fn cached_projection(&self, index: usize) -> Option<Vec<Point2>> {
        let frame = self.frame.lock().ok()?;
        frame.projections.get(index).cloned().flatten()
    }

    pub(crate) fn lock_frame(&self) -> Result<MutexGuard<'_, FrameCache>, RenderError> {
        self.frame.lock().map_err(|_| RenderError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Vec3};
    use crate::surface::Colour;

    #[test]
    fn indices_follow_insertion_order() {
        let mut scene = Scene::new();
        let a = scene.add(PointElement::new(Point3::ORIGIN, Colour::BLACK, 1.0));
        let b = scene.add(LineElement::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Colour::BLACK, 1.0));
        assert_eq!((a, b), (0, 1));
        assert_eq!(scene.element(1).map(Element::kind), Some(ElementKind::Line));
        assert!(scene.set_tag(0, Some("dot".into())));
        assert!(!scene.set_tag(7, None));
        assert_eq!(scene.elements()[0].tag(), Some("dot"));
    }

    #[test]
    fn transform_applies_to_every_element() {
        let mut scene = Scene::new();
        scene.add(PointElement::new(Point3::ORIGIN, Colour::BLACK, 1.0));
        scene.add(LineElement::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Colour::BLACK, 1.0));
        scene
            .transform(&Transform::translate(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        for element in scene.elements() {
            assert_eq!(element.vertices()[0], Point3::new(0.0, 2.0, 0.0));
        }
    }

    #[test]
    fn singular_transform_leaves_scene_untouched() {
        let mut scene = Scene::new();
        scene
            .add_triangle(
                Point3::ORIGIN,
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Vec::new(),
            )
            .unwrap();
        let flatten = Transform::scale(1.0, 1.0, 0.0);
        assert!(matches!(scene.transform(&flatten), Err(SceneError::SingularTransform)));
        assert_eq!(scene.elements()[0].vertices()[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn clear_recovers_a_poisoned_frame() {
        let mut scene = Scene::new();
        scene.add(PointElement::new(Point3::ORIGIN, Colour::BLACK, 1.0));
        scene.lock_frame().unwrap().reset(1);
        scene.frame.lock().unwrap().projections[0] = Some(vec![Point2::new(1.0, 1.0)]);

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _frame = scene.frame.lock().unwrap();
            panic!("render failed mid-frame");
        }));
        assert!(panicked.is_err());
        assert!(scene.frame.is_poisoned());
        assert!(matches!(scene.lock_frame(), Err(RenderError::Poisoned)));

        scene.clear();
        assert!(!scene.frame.is_poisoned());
        assert!(scene.lock_frame().unwrap().projections.is_empty());
        assert!(scene.cached_projection(0).is_none());
    }

    #[test]
    fn cache_is_empty_before_first_render() {
        let mut scene = Scene::new();
        scene.add(PointElement::new(Point3::ORIGIN, Colour::BLACK, 1.0));
        assert!(scene.cached_projection(0).is_none());
    }
}
