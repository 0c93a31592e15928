//! Interactive comparison of the three rendering strategies.
//!
//! Drag orbits the camera and scrolling zooms. Keys 1, 2 and 3 switch
//! between the naive, Forward+ and clustered deferred renderers while
//! `-` and `=` halve and double the number of animated lights.

use std::time::Instant;

use clap::Parser;
use glam::Vec3;
use lumen_engine::stage::{LightCount, Material, MeshData, Transform};
use lumen_engine::{window, Engine, EngineConfig, RenderError, RendererKind};
use winit::keyboard::KeyCode;

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Strategy {
    Naive,
    ForwardPlus,
    ClusteredDeferred,
}

impl From<Strategy> for RendererKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Naive => RendererKind::Naive,
            Strategy::ForwardPlus => RendererKind::ForwardPlus,
            Strategy::ClusteredDeferred => RendererKind::ClusteredDeferred,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Compare naive, Forward+, and clustered deferred shading")]
struct Args {
    /// Rendering strategy to start with
    #[arg(long, value_enum, default_value = "forward-plus")]
    renderer: Strategy,

    /// Number of animated point lights
    #[arg(long, default_value_t = 500)]
    lights: u32,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Present without vsync to measure uncapped frame times
    #[arg(long)]
    no_vsync: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = EngineConfig {
        renderer: args.renderer.into(),
        light_count: args.lights,
        width: args.width,
        height: args.height,
        vsync: !args.no_vsync,
        ..EngineConfig::default()
    };

    log::info!("Drag to orbit, scroll to zoom");
    log::info!("1/2/3 pick the renderer, -/= halve or double the lights, Esc quits");

    let title = config.title.clone();
    let (width, height) = (config.width, config.height);

    let mut engine: Option<Engine> = None;
    let mut last_frame = Instant::now();

    window::run(&title, width, height, move |window| {
        // The surface needs a live window, so the engine is built on the
        // first callback rather than up front.
        if engine.is_none() {
            match Engine::new(window.window_arc(), &config) {
                Ok(mut built) => {
                    populate_scene(&mut built);
                    last_frame = Instant::now();
                    engine = Some(built);
                }
                Err(err) => {
                    log::error!("Engine setup failed: {err}");
                    window.close();
                    return;
                }
            }
        }
        let Some(engine) = engine.as_mut() else {
            return;
        };

        for key in window.take_keys_pressed() {
            match key {
                KeyCode::Digit1 => engine.set_renderer(RendererKind::Naive),
                KeyCode::Digit2 => engine.set_renderer(RendererKind::ForwardPlus),
                KeyCode::Digit3 => engine.set_renderer(RendererKind::ClusteredDeferred),
                KeyCode::Minus => scale_light_count(engine, 0.5),
                KeyCode::Equal => scale_light_count(engine, 2.0),
                KeyCode::Escape => {
                    window.close();
                    return;
                }
                _ => {}
            }
        }

        let (drag_x, drag_y) = window.take_drag_delta();
        if drag_x != 0.0 || drag_y != 0.0 {
            let camera = &mut engine.stage_mut().camera;
            camera.orbit(drag_x * 0.006, -drag_y * 0.006);
        }

        let scroll = window.take_scroll_delta();
        if scroll != 0.0 {
            let camera = &mut engine.stage_mut().camera;
            let distance = camera.distance();
            camera.set_distance(distance * (1.0 - scroll * 0.1));
        }

        if window.was_resized() {
            let (w, h) = window.dimensions();
            engine.resize(w, h);
            window.clear_resize_flag();
        }

        let now = Instant::now();
        let delta_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        engine.on_frame(delta_time);
        match engine.draw() {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => {
                let (w, h) = window.dimensions();
                engine.resize(w, h);
            }
            Err(RenderError::OutOfMemory) => {
                log::error!("Out of GPU memory, shutting down");
                window.close();
            }
            Err(err) => log::warn!("Frame dropped: {err}"),
        }
    });
}

fn scale_light_count(engine: &mut Engine, factor: f32) {
    let LightCount::Known(current) = engine.stage().lights.light_count() else {
        return;
    };
    let next = ((current as f32 * factor) as u32).max(1);
    engine.stage_mut().lights.set_light_count(next);
    log::info!("Lights: {}", engine.stage().lights.light_count());
}

/// Fill the stage with a floor and a grid of columns and spheres for the
/// lights to wander through.
fn populate_scene(engine: &mut Engine) {
    let (ctx, stage) = engine.parts_mut();
    stage.camera.position = Vec3::new(10.0, 6.0, 14.0);

    let scene = &mut stage.scene;
    let floor = scene.add_mesh(ctx, &MeshData::plane(24.0, 24.0, 8));
    let cube = scene.add_mesh(ctx, &MeshData::cube());
    let sphere = scene.add_mesh(ctx, &MeshData::sphere(32, 16));

    let slate = scene.add_material(ctx, Material::slate());
    let brick = scene.add_material(ctx, Material::brick());
    let moss = scene.add_material(ctx, Material::moss());
    let sand = scene.add_material(ctx, Material::sand());
    let white = scene.add_material(ctx, Material::matte_white());

    scene.add_object(ctx, Transform::default(), slate, floor);

    let accents = [brick, moss, sand, white];
    for gx in -4i32..=4 {
        for gz in -4i32..=4 {
            if gx == 0 && gz == 0 {
                continue;
            }
            let x = gx as f32 * 2.4;
            let z = gz as f32 * 2.4;
            let material = accents[(gx + gz).rem_euclid(4) as usize];
            if (gx + gz).rem_euclid(2) == 0 {
                let column_height = 1.0 + (gx * 7 + gz * 3).rem_euclid(5) as f32 * 0.5;
                scene.add_object(
                    ctx,
                    Transform::from_position(Vec3::new(x, column_height * 0.5, z))
                        .with_scale(Vec3::new(0.8, column_height, 0.8)),
                    material,
                    cube,
                );
            } else {
                scene.add_object(
                    ctx,
                    Transform::from_position(Vec3::new(x, 0.6, z)).with_scale(Vec3::splat(1.2)),
                    material,
                    sphere,
                );
            }
        }
    }

    scene.add_object(
        ctx,
        Transform::from_position(Vec3::new(0.0, 1.4, 0.0)).with_scale(Vec3::splat(2.8)),
        white,
        sphere,
    );

    log::info!(
        "Scene ready: {} objects, {} materials",
        scene.node_count(),
        scene.material_count()
    );
}
