//! The render pipeline: cull, resample, project, compare, sort, paint.

mod diagnostics;
mod metrics;
pub mod order;
pub mod resample;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, FocusBlur, ProjectedElement, ViewRect};
use crate::geom::Point2;
use crate::material::{FillContext, LightSource};
use crate::scene::{Element, Scene};
use crate::surface::{FadedSurface, Page, Path, Stroke, Surface};

pub use diagnostics::RenderDiagnostics;
pub use metrics::{RenderMetrics, RenderTimingReport, TimingBucket};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("scene frame lock poisoned by an earlier panic")]
    Poisoned,
    #[error("resampling size must be positive and finite, got {size}")]
    InvalidResamplingSize { size: f64 },
}

/// Knobs for [`VectorRenderer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Split lines longer (squared) or triangles larger (area) than this on
    /// screen. `None` disables resampling.
    pub resampling_max_size: Option<f64>,
    /// Upper bound on resampling recursion.
    pub max_resample_depth: u32,
    /// Stroke width colour materials add around each triangle to hide seams.
    pub default_overfill: f64,
    /// Skip elements with a non-finite projected vertex.
    pub drop_non_finite: bool,
    /// Skip elements whose projection misses the camera's view rectangle.
    pub cull_outside_view: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resampling_max_size: None,
            max_resample_depth: 8,
            default_overfill: 0.0,
            drop_non_finite: true,
            cull_outside_view: true,
        }
    }
}

/// Element kept for painting, with the scene index it came from.
struct RenderItem<'a> {
    source: usize,
    element: Cow<'a, Element>,
    outline: Vec<Point2>,
}

/// Paints a [`Scene`] through a [`Camera`] in depth order.
#[derive(Debug, Clone, Default)]
pub struct VectorRenderer {
    options: RenderOptions,
}

impl VectorRenderer {
    pub fn new(options: RenderOptions) -> Result<Self, RenderError> {
        if let Some(size) = options.resampling_max_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(RenderError::InvalidResamplingSize { size });
            }
        }
        Ok(Self { options })
    }

    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders onto a fresh [`Page`] sized to the camera's view rectangle.
    pub fn render(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        lights: &[Box<dyn LightSource>],
    ) -> Result<(Page, RenderDiagnostics), RenderError> {
        let view = camera.view();
        let mut page = Page::new(view.top_left, view.width, view.height);
        let diagnostics = self.render_to(scene, camera, lights, &mut page)?;
        Ok((page, diagnostics))
    }

    /// Renders once per lens sample onto one page, each pass at `1/n` opacity.
    pub fn render_focus_blur<C: FocusBlur>(
        &self,
        scene: &Scene,
        camera: &C,
        lights: &[Box<dyn LightSource>],
    ) -> Result<(Page, RenderDiagnostics), RenderError> {
        let view = camera.view();
        let mut page = Page::new(view.top_left, view.width, view.height);
        let cameras = camera.sample_cameras();
        if cameras.len() <= 1 {
            let diagnostics = self.render_to(scene, camera, lights, &mut page)?;
            return Ok((page, diagnostics));
        }

        let opacity = 1.0 / cameras.len() as f64;
        let mut diagnostics = RenderDiagnostics::new();
        for sample in &cameras {
            let mut faded = FadedSurface::new(&mut page, opacity);
            let pass = self.render_to(scene, sample, lights, &mut faded)?;
            diagnostics.merge(&pass);
        }
        log::debug!("focus blur: {} passes, {}", cameras.len(), diagnostics.summary());
        Ok((page, diagnostics))
    }

    /// Runs the whole pipeline, painting onto `surface`.
    ///
    /// The scene's frame lock is held for the duration, so renders of the same
    /// scene never interleave.
    pub fn render_to(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        lights: &[Box<dyn LightSource>],
        surface: &mut dyn Surface,
    ) -> Result<RenderDiagnostics, RenderError> {
        let mut frame = scene.lock_frame()?;
        frame.reset(scene.len());

        let mut metrics = RenderMetrics::default();
        metrics.begin();
        let mut diagnostics = RenderDiagnostics {
            input_count: scene.len(),
            ..RenderDiagnostics::default()
        };

        let survivors: Vec<(usize, &Element)> = metrics.time(TimingBucket::Cull, || {
            scene
                .elements()
                .iter()
                .enumerate()
                .filter(|(_, element)| !camera.is_culled(element))
                .collect()
        });
        diagnostics.culled_count = scene.len() - survivors.len();

        metrics.time(TimingBucket::Project, || {
            for &(index, element) in &survivors {
                frame.projections[index] = Some(project_outline(camera, element));
            }
        });
        let projections = &frame.projections;

        let pieces: Vec<(usize, Cow<'_, Element>)> = metrics.time(TimingBucket::Resample, || {
            let mut pieces = Vec::with_capacity(survivors.len());
            for &(index, element) in &survivors {
                match (self.options.resampling_max_size, &projections[index]) {
                    (Some(max_size), Some(outline)) => {
                        let depth = self.options.max_resample_depth;
                        let split = resample::resample_projected(element, outline, camera, max_size, depth);
                        pieces.extend(split.into_iter().map(|piece| (index, piece)));
                    }
                    _ => pieces.push((index, Cow::Borrowed(element))),
                }
            }
            pieces
        });
        diagnostics.resampled_count = pieces.len() - survivors.len();

        let items = metrics.time(TimingBucket::Project, || {
            self.project_items(camera, pieces, projections, &mut diagnostics)
        });
        diagnostics.painted_count = items.len();

        let projected: Vec<ProjectedElement<'_>> = items
            .iter()
            .map(|item| ProjectedElement {
                element: item.element.as_ref(),
                outline: &item.outline,
            })
            .collect();
        let deps = metrics.time(TimingBucket::Compare, || {
            let results = order::compare_pairs(camera, &projected);
            order::dependencies(projected.len(), &results)
        });
        diagnostics.comparison_count = order::pair_count(projected.len());
        diagnostics.dependency_edge_count = deps.iter().map(Vec::len).sum();

        let sorted = metrics.time(TimingBucket::Sort, || order::topological_order(&deps));
        diagnostics.cycles_broken = sorted.cycles_broken;
        if sorted.cycles_broken > 0 {
            diagnostics.add_warning(format!(
                "{} dependency cycle(s) broken; overlapping elements may be misordered",
                sorted.cycles_broken
            ));
        }

        metrics.time(TimingBucket::Paint, || {
            for &i in &sorted.order {
                self.paint(&items[i], camera, lights, surface);
            }
        });
        diagnostics.paint_order = sorted.order.iter().map(|&i| items[i].source).collect();
        diagnostics.timing = metrics.end();

        log::debug!("render: {}", diagnostics.summary());
        Ok(diagnostics)
    }

    /// Pairs every piece with its outline and drops the ones that cannot be
    /// ordered or would not be seen. Unsplit pieces reuse the frame's cached
    /// projection of their source; only resampled pieces are projected here.
    fn project_items<'a>(
        &self,
        camera: &dyn Camera,
        pieces: Vec<(usize, Cow<'a, Element>)>,
        projections: &[Option<Vec<Point2>>],
        diagnostics: &mut RenderDiagnostics,
    ) -> Vec<RenderItem<'a>> {
        let view = camera.view();
        let mut items = Vec::with_capacity(pieces.len());
        for (source, element) in pieces {
            let cached = match &element {
                Cow::Borrowed(_) => projections.get(source).cloned().flatten(),
                Cow::Owned(_) => None,
            };
            let outline = cached.unwrap_or_else(|| project_outline(camera, &element));

            if self.options.drop_non_finite && outline.iter().any(|p| !p.is_finite()) {
                diagnostics.dropped_non_finite_count += 1;
                continue;
            }
            if self.options.cull_outside_view && !on_screen(&outline, element.screen_half_width(), view) {
                diagnostics.offscreen_count += 1;
                continue;
            }
            items.push(RenderItem {
                source,
                element,
                outline,
            });
        }
        if diagnostics.dropped_non_finite_count > 0 {
            log::warn!(
                "dropped {} element(s) with non-finite projections",
                diagnostics.dropped_non_finite_count
            );
        }
        items
    }

    fn paint(&self, item: &RenderItem<'_>, camera: &dyn Camera, lights: &[Box<dyn LightSource>], surface: &mut dyn Surface) {
        let tag = item.element.tag();
        match item.element.as_ref() {
            Element::Point(point) => {
                let path = Path::circle(item.outline[0], point.diameter * 0.5);
                surface.fill_path(&path, point.colour, tag);
            }
            Element::Line(line) => {
                let stroke = Stroke {
                    colour: line.colour,
                    thickness: line.thickness,
                    cap: line.cap,
                    dash: line.dash,
                };
                surface.stroke_path(&Path::polyline(&item.outline, false), &stroke, tag);
            }
            Element::Triangle(triangle) => {
                let context = FillContext {
                    outline: &item.outline,
                    centroid: triangle.centroid(),
                    normal: triangle.normal(),
                    triangle,
                    view_point: camera.view_point(),
                    camera,
                    lights,
                    scale_factor: camera.scale_factor(),
                    tag,
                    overfill: self.options.default_overfill,
                };
                for material in &triangle.fill {
                    material.fill(surface, &context);
                }
            }
        }
    }
}

/// Projects every vertex of `element`, in vertex order.
pub(crate) fn project_outline(camera: &dyn Camera, element: &Element) -> Vec<Point2> {
    element.vertices().iter().map(|p| camera.project(*p)).collect()
}

fn on_screen(outline: &[Point2], pad: f64, view: ViewRect) -> bool {
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in outline {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }
    view.intersects_box(Point2::new(min.x - pad, min.y - pad), Point2::new(max.x + pad, max.y + pad))
}
