//! GPU integration tests for the rendering strategies.
//!
//! Every strategy is driven through the same headless engine: populate a
//! stage, tick a frame, draw into an offscreen target, and read the pixels
//! back. Tests are parameterized with `rstest` so each strategy runs the
//! same contract, and they skip when no GPU adapter is available.

mod common;

use glam::Vec3;
use rstest::rstest;

use common::{create_target, headless_engine, pixel, populate_stage, read_texture_rgba, HEIGHT, WIDTH};
use lumen_engine::stage::{LightCount, Material, MaterialBatch, MeshData, SceneItem, Transform};
use lumen_engine::{RenderError, RendererKind};

// ============================================================================
// Draw Tests
// ============================================================================

/// Draw a populated stage offscreen and check the output.
///
/// The camera looks down at the floor, so the center pixel lands on lit
/// geometry while the top-left pixel is background. Background differs by
/// strategy: the forward paths clear the target to transparent black, the
/// deferred lighting pass writes opaque black.
#[rstest]
#[case::naive(RendererKind::Naive)]
#[case::forward_plus(RendererKind::ForwardPlus)]
#[case::clustered_deferred(RendererKind::ClusteredDeferred)]
fn renderer_draws_the_stage(#[case] kind: RendererKind) {
    let Some(mut engine) = headless_engine(kind) else {
        return;
    };
    populate_stage(&mut engine);

    for _ in 0..3 {
        engine.on_frame(0.016);
    }

    let (texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);
    engine.draw_to(&view).expect("offscreen draw should succeed");

    let data = read_texture_rgba(engine.ctx(), &texture, WIDTH, HEIGHT);

    let center = pixel(&data, WIDTH, WIDTH / 2, HEIGHT / 2);
    assert!(
        center[0] > 0 || center[1] > 0 || center[2] > 0,
        "{:?}: center pixel should be lit geometry, got {:?}",
        kind,
        center
    );

    let corner = pixel(&data, WIDTH, 0, 0);
    let expected = match kind {
        RendererKind::ClusteredDeferred => [0, 0, 0, 255],
        _ => [0, 0, 0, 0],
    };
    assert_eq!(
        corner, expected,
        "{:?}: background pixel should be the clear color",
        kind
    );
}

/// Drawing several frames in a row must keep working while the lights move.
#[rstest]
#[case::naive(RendererKind::Naive)]
#[case::forward_plus(RendererKind::ForwardPlus)]
#[case::clustered_deferred(RendererKind::ClusteredDeferred)]
fn renderer_survives_consecutive_frames(#[case] kind: RendererKind) {
    let Some(mut engine) = headless_engine(kind) else {
        return;
    };
    populate_stage(&mut engine);
    let (_texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);

    for _ in 0..5 {
        engine.on_frame(0.033);
        engine.draw_to(&view).expect("draw should succeed");
    }
}

// ============================================================================
// Resize Tests
// ============================================================================

/// Resizing must rebuild every surface-sized resource so that the next draw
/// targets the new dimensions cleanly.
#[rstest]
#[case::naive(RendererKind::Naive)]
#[case::forward_plus(RendererKind::ForwardPlus)]
#[case::clustered_deferred(RendererKind::ClusteredDeferred)]
fn resize_rebuilds_surface_sized_resources(#[case] kind: RendererKind) {
    let Some(mut engine) = headless_engine(kind) else {
        return;
    };
    populate_stage(&mut engine);

    engine.on_frame(0.016);
    let (_full, full_view) = create_target(engine.ctx(), WIDTH, HEIGHT);
    engine.draw_to(&full_view).expect("draw at initial size");

    engine.resize(128, 96);
    assert_eq!(engine.ctx().surface_size(), (128, 96));

    engine.on_frame(0.016);
    let (_small, small_view) = create_target(engine.ctx(), 128, 96);
    engine.draw_to(&small_view).expect("draw after resize");

    // Zero dimensions are ignored rather than tearing down the swapchain.
    engine.resize(0, 0);
    assert_eq!(engine.ctx().surface_size(), (128, 96));
}

// ============================================================================
// Strategy Swap Tests
// ============================================================================

/// Switching strategies mid-run keeps the stage intact; only the renderer
/// is torn down and rebuilt.
#[test]
fn renderer_swap_preserves_the_stage() {
    let Some(mut engine) = headless_engine(RendererKind::Naive) else {
        return;
    };
    populate_stage(&mut engine);
    let nodes_before = engine.stage().scene.node_count();
    let lights_before = engine.stage().lights.light_count();

    for kind in [
        RendererKind::ForwardPlus,
        RendererKind::ClusteredDeferred,
        RendererKind::Naive,
    ] {
        engine.set_renderer(kind);
        assert_eq!(engine.renderer_kind(), kind);
        assert_eq!(engine.stage().scene.node_count(), nodes_before);
        assert_eq!(engine.stage().lights.light_count(), lights_before);

        engine.on_frame(0.016);
        let (_texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);
        engine.draw_to(&view).expect("draw after swap");
    }
}

// ============================================================================
// Light Count Tests
// ============================================================================

/// The active light count is adjustable at runtime and clamped to capacity.
#[test]
fn light_count_is_clamped_and_reported() {
    let Some(mut engine) = headless_engine(RendererKind::ForwardPlus) else {
        return;
    };
    populate_stage(&mut engine);
    assert_eq!(engine.stage().lights.light_count(), LightCount::Known(64));

    engine.stage_mut().lights.set_light_count(32);
    assert_eq!(engine.stage().lights.light_count(), LightCount::Known(32));

    let capacity = engine.stage().lights.max_lights();
    engine.stage_mut().lights.set_light_count(1_000_000);
    assert_eq!(
        engine.stage().lights.light_count(),
        LightCount::Known(capacity)
    );

    engine.on_frame(0.016);
    let (_texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);
    engine.draw_to(&view).expect("draw with clamped light count");
}

/// With zero active lights the draw must still complete; only ambient
/// shading remains.
#[rstest]
#[case::naive(RendererKind::Naive)]
#[case::forward_plus(RendererKind::ForwardPlus)]
#[case::clustered_deferred(RendererKind::ClusteredDeferred)]
fn zero_lights_still_draws(#[case] kind: RendererKind) {
    let Some(mut engine) = headless_engine(kind) else {
        return;
    };
    populate_stage(&mut engine);
    engine.stage_mut().lights.set_light_count(0);
    assert_eq!(engine.stage().lights.light_count(), LightCount::Known(0));

    engine.on_frame(0.016);
    let (texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);
    engine.draw_to(&view).expect("draw with zero lights");

    let data = read_texture_rgba(engine.ctx(), &texture, WIDTH, HEIGHT);
    let center = pixel(&data, WIDTH, WIDTH / 2, HEIGHT / 2);
    assert!(
        center[0] > 0,
        "{:?}: ambient shading should survive zero lights, got {:?}",
        kind,
        center
    );
}

// ============================================================================
// Cross-Strategy Equivalence Tests
// ============================================================================

fn render_once(kind: RendererKind) -> Option<Vec<u8>> {
    let mut engine = headless_engine(kind)?;
    populate_stage(&mut engine);
    engine.on_frame(0.016);
    let (texture, view) = create_target(engine.ctx(), WIDTH, HEIGHT);
    engine.draw_to(&view).expect("draw should succeed");
    Some(read_texture_rgba(engine.ctx(), &texture, WIDTH, HEIGHT))
}

fn max_rgb_difference(a: &[u8], b: &[u8]) -> u8 {
    a.chunks(4)
        .zip(b.chunks(4))
        .flat_map(|(pa, pb)| {
            pa[..3]
                .iter()
                .zip(&pb[..3])
                .map(|(&ca, &cb)| ca.abs_diff(cb))
        })
        .max()
        .unwrap_or(0)
}

/// Both forward strategies light the same fragments the same way; culling
/// only removes lights whose contribution is already zero. The same stage
/// and the same frame time must therefore give matching images.
#[test]
fn forward_strategies_render_equivalent_images() {
    let Some(naive) = render_once(RendererKind::Naive) else {
        return;
    };
    let Some(forward_plus) = render_once(RendererKind::ForwardPlus) else {
        return;
    };

    let diff = max_rgb_difference(&naive, &forward_plus);
    assert!(
        diff <= 2,
        "forward strategies diverged by {diff} color steps"
    );
}

/// The deferred path shades from G-buffer attributes instead of interpolated
/// ones, so a small tolerance covers the reduced attribute precision.
#[test]
fn deferred_matches_forward_within_gbuffer_precision() {
    let Some(forward_plus) = render_once(RendererKind::ForwardPlus) else {
        return;
    };
    let Some(deferred) = render_once(RendererKind::ClusteredDeferred) else {
        return;
    };

    let diff = max_rgb_difference(&forward_plus, &deferred);
    assert!(
        diff <= 12,
        "deferred output diverged by {diff} color steps"
    );
}

// ============================================================================
// Surface Tests
// ============================================================================

/// A headless engine has no presentation surface to draw to.
#[test]
fn draw_without_surface_reports_the_error() {
    let Some(mut engine) = headless_engine(RendererKind::Naive) else {
        return;
    };
    populate_stage(&mut engine);
    engine.on_frame(0.016);

    let err = engine.draw().expect_err("headless draw must fail");
    assert!(matches!(err, RenderError::NoSurface));
}

// ============================================================================
// Scene Iteration Tests
// ============================================================================

/// Scene traversal visits nodes, then their materials, then the primitives
/// of each material batch, skipping batches with unknown ids.
#[test]
fn scene_iterates_in_node_material_primitive_order() {
    let Some(mut engine) = headless_engine(RendererKind::Naive) else {
        return;
    };
    let (ctx, stage) = engine.parts_mut();
    let scene = &mut stage.scene;

    let cube = scene.add_mesh(ctx, &MeshData::cube());
    let sphere = scene.add_mesh(ctx, &MeshData::sphere(8, 4));
    let slate = scene.add_material(ctx, Material::slate());
    let brick = scene.add_material(ctx, Material::brick());

    scene.add_object(ctx, Transform::default(), slate, cube);
    scene.add_node(
        ctx,
        Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),
        vec![
            MaterialBatch {
                material: brick,
                primitives: vec![cube, sphere],
            },
            MaterialBatch {
                material: 999,
                primitives: vec![cube],
            },
            MaterialBatch {
                material: slate,
                primitives: vec![sphere],
            },
        ],
    );

    let mut order = String::new();
    scene.iterate(|item| {
        order.push(match item {
            SceneItem::Node(_) => 'n',
            SceneItem::Material(_) => 'm',
            SceneItem::Primitive(_) => 'p',
        });
    });

    assert_eq!(order, "nmpnmppmp");
}
