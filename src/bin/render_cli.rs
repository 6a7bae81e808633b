#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("render_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use scene3d_engine::camera::{Camera, CameraControls, OrthographicCamera, PerspectiveCamera, ViewRect};
    use scene3d_engine::geom::{Point2, Point3, Vec3};
    use scene3d_engine::material::{
        AmbientLight, ColourMaterial, LightSource, Material, ParallelLight, PhongMaterial,
    };
    use scene3d_engine::render::{RenderDiagnostics, RenderOptions, VectorRenderer};
    use scene3d_engine::scene::Scene;
    use scene3d_engine::surface::{Colour, DrawCommand, Page, Path, PathSegment};
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path as FsPath, PathBuf};
    use std::sync::Arc;

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"render_cli (scene3d-engine)

USAGE:
  render_cli list
  render_cli run <scenario|all> [options]

SCENARIOS:
  cube_corner
  sphere_lit
  prism_star
  crossing_lines
  resampled_plane
  focus_blur_cube

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.svg and/or <scenario>.snap to this dir (required for `all`)
  --svg <path>       Write SVG (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-svg           Skip SVG when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut svg_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_svg = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--svg" => svg_path = Some(PathBuf::from(args.value("--svg")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-svg" => write_svg = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if svg_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --svg/--snap (not both)".to_string());
            }
            if !write_svg && !write_snap {
                return Err("nothing to write (both --no-svg and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_svg, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_svg, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = svg_path.as_deref() {
            write_text_file(path, &svg_document(&output.page), overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!("{}: {}", output.name, output.diagnostics.summary());
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &FsPath,
        write_svg: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_svg {
            let path = dir.join(format!("{}.svg", output.name));
            write_text_file(&path, &svg_document(&output.page), overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!("{}: {}", output.name, output.diagnostics.summary());
        Ok(())
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &FsPath, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_points(out: &mut String, points: &[Point2]) {
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                out.push_str(" |");
            }
            out.push(' ');
            write_f64(out, p.x);
            out.push(' ');
            write_f64(out, p.y);
        }
    }

    fn write_colour(out: &mut String, colour: Colour) {
        let _ = write!(out, "rgba {:.4} {:.4} {:.4} {:.4}", colour.r, colour.g, colour.b, colour.a);
    }

    fn write_diagnostics(out: &mut String, diag: &RenderDiagnostics) {
        let _ = writeln!(out, "diag.input {}", diag.input_count);
        let _ = writeln!(out, "diag.culled {}", diag.culled_count);
        let _ = writeln!(out, "diag.offscreen {}", diag.offscreen_count);
        let _ = writeln!(out, "diag.resampled {}", diag.resampled_count);
        let _ = writeln!(out, "diag.non_finite {}", diag.dropped_non_finite_count);
        let _ = writeln!(out, "diag.painted {}", diag.painted_count);
        let _ = writeln!(out, "diag.comparisons {}", diag.comparison_count);
        let _ = writeln!(out, "diag.edges {}", diag.dependency_edge_count);
        let _ = writeln!(out, "diag.cycles {}", diag.cycles_broken);
        let order: Vec<String> = diag.paint_order.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "paint_order {}", order.join(" "));
    }

    fn write_page(out: &mut String, page: &Page) {
        let _ = writeln!(out, "commands {}", page.commands().len());
        for command in page.commands() {
            match command {
                DrawCommand::Fill { path, colour, .. } => {
                    out.push_str("fill ");
                    write_colour(out, *colour);
                    write_path(out, path);
                }
                DrawCommand::Stroke { path, stroke, .. } => {
                    out.push_str("stroke ");
                    write_colour(out, stroke.colour);
                    out.push_str(" w ");
                    write_f64(out, stroke.thickness);
                    write_path(out, path);
                }
                DrawCommand::Text { origin, text, .. } => {
                    let _ = write!(out, "text {text:?} at");
                    write_points(out, &[*origin]);
                }
            }
            if let Some(tag) = command.tag() {
                let _ = write!(out, " #{tag}");
            }
            out.push('\n');
        }
    }

    fn write_path(out: &mut String, path: &Path) {
        for (points, closed) in path.flatten() {
            out.push_str(" [");
            write_points(out, &points);
            out.push_str(if closed { " ]z" } else { " ]" });
        }
    }

    fn snapshot(name: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# scene3d-engine golden v1");
        let _ = writeln!(out, "scenario {name}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    fn svg_colour(colour: Colour) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", channel(colour.r), channel(colour.g), channel(colour.b))
    }

    fn svg_path_data(path: &Path) -> String {
        let mut d = String::new();
        for segment in &path.segments {
            match segment {
                PathSegment::MoveTo { point } => {
                    let _ = write!(d, "M{} {} ", point.x, point.y);
                }
                PathSegment::LineTo { point } => {
                    let _ = write!(d, "L{} {} ", point.x, point.y);
                }
                PathSegment::Arc { center, radius, .. } => {
                    // Only full circles are emitted by the renderer.
                    let _ = write!(
                        d,
                        "M{} {} a{r} {r} 0 1 0 {} 0 a{r} {r} 0 1 0 {} 0 ",
                        center.x - radius,
                        center.y,
                        2.0 * radius,
                        -2.0 * radius,
                        r = radius
                    );
                }
                PathSegment::Close => d.push_str("Z "),
            }
        }
        d.trim_end().to_string()
    }

    fn svg_document(page: &Page) -> String {
        let origin = page.origin();
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            origin.x,
            origin.y,
            page.width(),
            page.height()
        );
        for command in page.commands() {
            match command {
                DrawCommand::Fill { path, colour, .. } => {
                    let _ = writeln!(
                        out,
                        r#"  <path d="{}" fill="{}" fill-opacity="{}"/>"#,
                        svg_path_data(path),
                        svg_colour(*colour),
                        colour.a
                    );
                }
                DrawCommand::Stroke { path, stroke, .. } => {
                    let _ = writeln!(
                        out,
                        r#"  <path d="{}" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}"/>"#,
                        svg_path_data(path),
                        svg_colour(stroke.colour),
                        stroke.colour.a,
                        stroke.thickness
                    );
                }
                DrawCommand::Text {
                    origin,
                    text,
                    font,
                    colour,
                    ..
                } => {
                    let _ = writeln!(
                        out,
                        r#"  <text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
                        origin.x,
                        origin.y,
                        font.family,
                        font.size,
                        svg_colour(*colour),
                        text
                    );
                }
            }
        }
        out.push_str("</svg>\n");
        out
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        CubeCorner,
        SphereLit,
        PrismStar,
        CrossingLines,
        ResampledPlane,
        FocusBlurCube,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::CubeCorner,
            Scenario::SphereLit,
            Scenario::PrismStar,
            Scenario::CrossingLines,
            Scenario::ResampledPlane,
            Scenario::FocusBlurCube,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::CubeCorner => "cube_corner",
                Scenario::SphereLit => "sphere_lit",
                Scenario::PrismStar => "prism_star",
                Scenario::CrossingLines => "crossing_lines",
                Scenario::ResampledPlane => "resampled_plane",
                Scenario::FocusBlurCube => "focus_blur_cube",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Scenario::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        page: Page,
        diagnostics: RenderDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let (page, diagnostics) = match scenario {
            Scenario::CubeCorner => scenario_cube_corner()?,
            Scenario::SphereLit => scenario_sphere_lit()?,
            Scenario::PrismStar => scenario_prism_star()?,
            Scenario::CrossingLines => scenario_crossing_lines()?,
            Scenario::ResampledPlane => scenario_resampled_plane()?,
            Scenario::FocusBlurCube => scenario_focus_blur_cube()?,
        };
        let name = scenario.name();
        let snapshot = snapshot(name, |out| {
            write_diagnostics(out, &diagnostics);
            write_page(out, &page);
        });
        Ok(ScenarioOutput {
            name,
            page,
            diagnostics,
            snapshot,
        })
    }

    fn flat(colour: Colour) -> Vec<Arc<dyn Material>> {
        vec![Arc::new(ColourMaterial::new(colour))]
    }

    fn corner_camera() -> Result<PerspectiveCamera, String> {
        PerspectiveCamera::new(Point3::new(-10.0, -10.0, -10.0), Vec3::new(1.0, 1.0, 1.0), 5.0)
            .and_then(|camera| camera.with_view(ViewRect::centered(4.0, 4.0)))
            .map_err(|e| e.to_string())
    }

    fn render(scene: &Scene, camera: &dyn Camera, lights: &[Box<dyn LightSource>]) -> Result<(Page, RenderDiagnostics), String> {
        VectorRenderer::default()
            .render(scene, camera, lights)
            .map_err(|e| e.to_string())
    }

    fn scenario_cube_corner() -> Result<(Page, RenderDiagnostics), String> {
        let mut scene = Scene::new();
        let faces = scene
            .add_cube(Point3::ORIGIN, 2.0, flat(Colour::from_rgb8(70, 130, 180)))
            .map_err(|e| e.to_string())?;
        scene.add_wireframe(faces, Colour::BLACK, 0.02);
        render(&scene, &corner_camera()?, &[])
    }

    fn scenario_sphere_lit() -> Result<(Page, RenderDiagnostics), String> {
        let mut scene = Scene::new();
        let material: Arc<dyn Material> =
            Arc::new(PhongMaterial::new(Colour::from_rgb8(200, 60, 60)).with_overfill(0.01));
        scene
            .add_sphere(Point3::ORIGIN, 1.5, 12, 24, vec![material])
            .map_err(|e| e.to_string())?;
        let key = ParallelLight::new(Vec3::new(1.0, 1.0, 2.0), 0.8).ok_or("light direction is zero")?;
        let lights: Vec<Box<dyn LightSource>> = vec![Box::new(AmbientLight::new(0.2)), Box::new(key)];
        let camera = PerspectiveCamera::new(Point3::new(0.0, 0.0, -8.0), Vec3::Z, 4.0)
            .and_then(|camera| camera.with_view(ViewRect::centered(4.0, 4.0)))
            .map_err(|e| e.to_string())?;
        render(&scene, &camera, &lights)
    }

    fn scenario_prism_star() -> Result<(Page, RenderDiagnostics), String> {
        let star: Vec<Point2> = (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { 1.0 } else { 0.45 };
                let angle = std::f64::consts::TAU * f64::from(i) / 10.0;
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        let mut scene = Scene::new();
        scene
            .add_prism(&star, Point3::ORIGIN, Vec3::X, Vec3::Y, 0.5, flat(Colour::from_rgb8(240, 200, 40)))
            .map_err(|e| e.to_string())?;
        let mut camera = OrthographicCamera::new(Point3::new(0.0, 0.0, -5.0), Vec3::Z)
            .and_then(|camera| camera.with_view(ViewRect::centered(3.0, 3.0)))
            .and_then(|camera| camera.with_orbit_origin(Point3::ORIGIN))
            .map_err(|e| e.to_string())?;
        camera.orbit(0.6, 0.4).map_err(|e| e.to_string())?;
        render(&scene, &camera, &[])
    }

    fn scenario_crossing_lines() -> Result<(Page, RenderDiagnostics), String> {
        let mut scene = Scene::new();
        let mut add_line = |a: Point3, b: Point3, colour: Colour| {
            scene.add_line(a, b, colour, 0.05).map_err(|e| e.to_string())
        };
        add_line(Point3::new(-1.0, -1.0, 1.0), Point3::new(1.0, 1.0, 1.0), Colour::from_rgb8(200, 0, 0))?;
        add_line(Point3::new(-1.0, 1.0, 0.0), Point3::new(1.0, -1.0, 0.0), Colour::from_rgb8(0, 0, 200))?;
        scene
            .add_point(Point3::new(0.0, 0.0, -0.5), Colour::BLACK, 0.1)
            .map_err(|e| e.to_string())?;
        let camera = PerspectiveCamera::new(Point3::new(0.0, 0.0, -5.0), Vec3::Z, 2.5)
            .and_then(|camera| camera.with_view(ViewRect::centered(3.0, 3.0)))
            .map_err(|e| e.to_string())?;
        render(&scene, &camera, &[])
    }

    fn scenario_resampled_plane() -> Result<(Page, RenderDiagnostics), String> {
        let mut scene = Scene::new();
        scene
            .add_rectangle(
                Point3::new(-2.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 6.0),
                flat(Colour::from_rgb8(90, 160, 90)),
            )
            .map_err(|e| e.to_string())?;
        let camera = PerspectiveCamera::new(Point3::new(0.0, 1.5, -3.0), Vec3::new(0.0, -0.4, 1.0), 2.0)
            .and_then(|camera| camera.with_view(ViewRect::centered(4.0, 4.0)))
            .map_err(|e| e.to_string())?;
        let renderer = VectorRenderer::new(RenderOptions {
            resampling_max_size: Some(0.1),
            max_resample_depth: 4,
            ..RenderOptions::default()
        })
        .map_err(|e| e.to_string())?;
        renderer.render(&scene, &camera, &[]).map_err(|e| e.to_string())
    }

    fn scenario_focus_blur_cube() -> Result<(Page, RenderDiagnostics), String> {
        let mut scene = Scene::new();
        scene
            .add_cube(Point3::ORIGIN, 2.0, flat(Colour::from_rgb8(70, 130, 180)))
            .map_err(|e| e.to_string())?;
        let camera = corner_camera()?
            .with_focus_blur(0.3, 6)
            .map_err(|e| e.to_string())?;
        VectorRenderer::default()
            .render_focus_blur(&scene, &camera, &[])
            .map_err(|e| e.to_string())
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
