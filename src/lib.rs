#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod geom;
pub mod material;
pub mod render;
pub mod scene;
pub mod surface;

use std::fmt;
use std::sync::Arc;

use camera::{Camera, CameraControls, OrthographicCamera, PerspectiveCamera, ViewRect};
use geom::{Point2, Point3, Vec3};
use material::{AmbientLight, ColourMaterial, LightSource, Material, ParallelLight, PhongMaterial, PointLight};
use render::{RenderDiagnostics, RenderError, RenderOptions, VectorRenderer};
use scene::Scene;
use serde::Serialize;
use surface::{Colour, Page};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no panic hook outside the browser
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// The camera the engine currently renders through.
#[derive(Debug, Clone)]
enum ActiveCamera {
    Perspective(PerspectiveCamera),
    Orthographic(OrthographicCamera),
}

impl ActiveCamera {
    fn as_camera(&self) -> &dyn Camera {
        match self {
            Self::Perspective(camera) => camera,
            Self::Orthographic(camera) => camera,
        }
    }

    fn controls(&mut self) -> &mut dyn CameraControls {
        match self {
            Self::Perspective(camera) => camera,
            Self::Orthographic(camera) => camera,
        }
    }
}

impl Default for ActiveCamera {
    fn default() -> Self {
        Self::Perspective(PerspectiveCamera::default())
    }
}

#[derive(Debug, Serialize)]
struct RenderExport<'a> {
    page: &'a Page,
    diagnostics: &'a RenderDiagnostics,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    scene: Scene,
    camera: ActiveCamera,
    lights: Vec<Box<dyn LightSource>>,
    renderer: VectorRenderer,
    last_page: Option<Page>,
    last_diagnostics: Option<RenderDiagnostics>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            scene: Scene::new(),
            camera: ActiveCamera::default(),
            lights: Vec::new(),
            renderer: VectorRenderer::default(),
            last_page: None,
            last_diagnostics: None,
        }
    }

    /// Number of elements in the scene.
    #[wasm_bindgen]
    pub fn element_count(&self) -> usize {
        self.scene.len()
    }

    /// Removes all elements and lights. The camera is kept.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.scene.clear();
        self.lights.clear();
        self.invalidate();
    }

    /// Switches to a perspective camera looking along `(dx, dy, dz)`.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn set_perspective_camera(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        dx: f64,
        dy: f64,
        dz: f64,
        distance: f64,
        view_width: f64,
        view_height: f64,
    ) -> Result<(), JsValue> {
        let camera = PerspectiveCamera::new(Point3::new(x, y, z), Vec3::new(dx, dy, dz), distance)
            .and_then(|camera| camera.with_view(ViewRect::centered(view_width, view_height)))
            .map_err(to_js_error)?;
        self.camera = ActiveCamera::Perspective(camera);
        self.invalidate();
        Ok(())
    }

    /// Switches to an orthographic camera looking along `(dx, dy, dz)`.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn set_orthographic_camera(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        dx: f64,
        dy: f64,
        dz: f64,
        view_width: f64,
        view_height: f64,
    ) -> Result<(), JsValue> {
        let camera = OrthographicCamera::new(Point3::new(x, y, z), Vec3::new(dx, dy, dz))
            .and_then(|camera| camera.with_view(ViewRect::centered(view_width, view_height)))
            .map_err(to_js_error)?;
        self.camera = ActiveCamera::Orthographic(camera);
        self.invalidate();
        Ok(())
    }

    /// Enables depth-of-field blur on the perspective camera.
    #[wasm_bindgen]
    pub fn set_focus_blur(&mut self, lens_width: f64, sampling_points: usize) -> Result<(), JsValue> {
        let ActiveCamera::Perspective(camera) = &self.camera else {
            return Err(js_error("focus blur needs a perspective camera"));
        };
        let camera = camera
            .clone()
            .with_focus_blur(lens_width, sampling_points)
            .map_err(to_js_error)?;
        self.camera = ActiveCamera::Perspective(camera);
        self.invalidate();
        Ok(())
    }

    /// Replaces the render options with a (partial) options object.
    #[wasm_bindgen]
    pub fn set_render_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: RenderOptions = serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        self.renderer = VectorRenderer::new(options).map_err(to_js_error)?;
        self.invalidate();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn add_point(&mut self, x: f64, y: f64, z: f64, diameter: f64, r: f64, g: f64, b: f64) -> Result<usize, JsValue> {
        let index = self
            .scene
            .add_point(Point3::new(x, y, z), Colour::rgb(r, g, b), diameter)
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(index)
    }

    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_line(
        &mut self,
        x0: f64,
        y0: f64,
        z0: f64,
        x1: f64,
        y1: f64,
        z1: f64,
        thickness: f64,
        r: f64,
        g: f64,
        b: f64,
    ) -> Result<usize, JsValue> {
        let index = self
            .scene
            .add_line(
                Point3::new(x0, y0, z0),
                Point3::new(x1, y1, z1),
                Colour::rgb(r, g, b),
                thickness,
            )
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(index)
    }

    /// Adds one triangle. It is visible from the side where `a`, `b`, `c`
    /// appear counter-clockwise.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_triangle(
        &mut self,
        ax: f64,
        ay: f64,
        az: f64,
        bx: f64,
        by: f64,
        bz: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        r: f64,
        g: f64,
        b: f64,
        shaded: bool,
    ) -> Result<usize, JsValue> {
        let index = self
            .scene
            .add_triangle(
                Point3::new(ax, ay, az),
                Point3::new(bx, by, bz),
                Point3::new(cx, cy, cz),
                fill_for(Colour::rgb(r, g, b), shaded),
            )
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(index)
    }

    /// Adds a flat polygon. `xy` holds interleaved 2D coordinates in the plane
    /// through `(ox, oy, oz)` spanned by the `u` and `v` axes; the polygon faces
    /// along `u x v`.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_polygon(
        &mut self,
        xy: &[f64],
        ox: f64,
        oy: f64,
        oz: f64,
        ux: f64,
        uy: f64,
        uz: f64,
        vx: f64,
        vy: f64,
        vz: f64,
        r: f64,
        g: f64,
        b: f64,
        shaded: bool,
    ) -> Result<Vec<usize>, JsValue> {
        let points = planar_points(xy)?;
        let range = self
            .scene
            .add_polygon(
                &points,
                Point3::new(ox, oy, oz),
                Vec3::new(ux, uy, uz),
                Vec3::new(vx, vy, vz),
                fill_for(Colour::rgb(r, g, b), shaded),
            )
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(range.collect())
    }

    /// Extrudes the polygon described as in [`Engine::add_polygon`] by
    /// `height` along `u x v`, closing both ends.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_prism(
        &mut self,
        xy: &[f64],
        ox: f64,
        oy: f64,
        oz: f64,
        ux: f64,
        uy: f64,
        uz: f64,
        vx: f64,
        vy: f64,
        vz: f64,
        height: f64,
        r: f64,
        g: f64,
        b: f64,
        shaded: bool,
    ) -> Result<Vec<usize>, JsValue> {
        let points = planar_points(xy)?;
        let range = self
            .scene
            .add_prism(
                &points,
                Point3::new(ox, oy, oz),
                Vec3::new(ux, uy, uz),
                Vec3::new(vx, vy, vz),
                height,
                fill_for(Colour::rgb(r, g, b), shaded),
            )
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(range.collect())
    }

    /// Adds an axis-aligned cube and returns the indices of its triangles.
    /// `shaded` selects a lit material instead of a flat colour.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_cube(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        size: f64,
        r: f64,
        g: f64,
        b: f64,
        shaded: bool,
    ) -> Result<Vec<usize>, JsValue> {
        let fill = fill_for(Colour::rgb(r, g, b), shaded);
        let range = self
            .scene
            .add_cube(Point3::new(x, y, z), size, fill)
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(range.collect())
    }

    /// Adds a UV sphere and returns the indices of its triangles.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_sphere(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        radius: f64,
        rings: usize,
        segments: usize,
        r: f64,
        g: f64,
        b: f64,
        shaded: bool,
    ) -> Result<Vec<usize>, JsValue> {
        let fill = fill_for(Colour::rgb(r, g, b), shaded);
        let range = self
            .scene
            .add_sphere(Point3::new(x, y, z), radius, rings, segments, fill)
            .map_err(to_js_error)?;
        self.invalidate();
        Ok(range.collect())
    }

    /// Outlines the edges of the given elements with lines.
    #[wasm_bindgen]
    pub fn add_wireframe(&mut self, start: usize, end: usize, thickness: f64, r: f64, g: f64, b: f64) -> Vec<usize> {
        let end = end.min(self.scene.len());
        let range = self
            .scene
            .add_wireframe(start.min(end)..end, Colour::rgb(r, g, b), thickness);
        self.invalidate();
        range.collect()
    }

    /// Tags an element so it can be found again with [`Engine::hit_test`].
    #[wasm_bindgen]
    pub fn set_tag(&mut self, index: usize, tag: Option<String>) -> Result<(), JsValue> {
        if !self.scene.set_tag(index, tag) {
            return Err(js_error("element index out of range"));
        }
        self.invalidate();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn add_ambient_light(&mut self, intensity: f64) {
        self.lights.push(Box::new(AmbientLight::new(intensity)));
        self.invalidate();
    }

    #[wasm_bindgen]
    pub fn add_parallel_light(&mut self, dx: f64, dy: f64, dz: f64, intensity: f64) -> Result<(), JsValue> {
        let light = ParallelLight::new(Vec3::new(dx, dy, dz), intensity)
            .ok_or_else(|| js_error("light direction must be non-zero"))?;
        self.lights.push(Box::new(light));
        self.invalidate();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn add_point_light(&mut self, x: f64, y: f64, z: f64, intensity: f64, distance: f64) {
        self.lights
            .push(Box::new(PointLight::new(Point3::new(x, y, z), intensity, distance)));
        self.invalidate();
    }

    #[wasm_bindgen]
    pub fn orbit(&mut self, theta: f64, phi: f64) -> Result<(), JsValue> {
        self.camera.controls().orbit(theta, phi).map_err(to_js_error)?;
        self.invalidate();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn pan(&mut self, x: f64, y: f64) {
        self.camera.controls().pan(x, y);
        self.invalidate();
    }

    #[wasm_bindgen]
    pub fn zoom(&mut self, amount: f64) -> Result<(), JsValue> {
        self.camera.controls().zoom(amount).map_err(to_js_error)?;
        self.invalidate();
        Ok(())
    }

    /// Renders the scene and returns `{ page, diagnostics }`.
    #[wasm_bindgen]
    pub fn render(&mut self) -> Result<JsValue, JsValue> {
        self.ensure_rendered().map_err(to_js_error)?;
        let (Some(page), Some(diagnostics)) = (self.last_page.as_ref(), self.last_diagnostics.as_ref()) else {
            return Err(js_error("render produced no page"));
        };
        serde_wasm_bindgen::to_value(&RenderExport { page, diagnostics })
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Tag of the topmost tagged element painted at `(x, y)` in the last
    /// render.
    #[wasm_bindgen]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<String> {
        self.last_page
            .as_ref()
            .and_then(|page| page.hit_test(Point2::new(x, y)))
            .map(str::to_string)
    }
}

impl Engine {
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_camera()
    }

    /// Renders without going through `JsValue`; used by native callers.
    pub fn render_page(&mut self) -> Result<(Page, RenderDiagnostics), RenderError> {
        self.ensure_rendered()?;
        match (self.last_page.clone(), self.last_diagnostics.clone()) {
            (Some(page), Some(diagnostics)) => Ok((page, diagnostics)),
            _ => Ok((Page::new(Point2::ORIGIN, 0.0, 0.0), RenderDiagnostics::new())),
        }
    }

    fn ensure_rendered(&mut self) -> Result<(), RenderError> {
        if self.last_page.is_some() {
            return Ok(());
        }
        let (page, diagnostics) = match &self.camera {
            ActiveCamera::Perspective(camera) => {
                self.renderer
                    .render_focus_blur(&self.scene, camera, &self.lights)?
            }
            ActiveCamera::Orthographic(camera) => self.renderer.render(&self.scene, camera, &self.lights)?,
        };
        debug_log!("engine render: {}", diagnostics.summary());
        self.last_page = Some(page);
        self.last_diagnostics = Some(diagnostics);
        Ok(())
    }

    fn invalidate(&mut self) {
        self.last_page = None;
        self.last_diagnostics = None;
    }
}

fn fill_for(colour: Colour, shaded: bool) -> Vec<Arc<dyn Material>> {
    if shaded {
        vec![Arc::new(PhongMaterial::new(colour))]
    } else {
        vec![Arc::new(ColourMaterial::new(colour))]
    }
}

fn planar_points(xy: &[f64]) -> Result<Vec<Point2>, JsValue> {
    if xy.len() % 2 != 0 {
        return Err(js_error("polygon coordinates must come in x, y pairs"));
    }
    Ok(xy.chunks_exact(2).map(|pair| Point2::new(pair[0], pair[1])).collect())
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
