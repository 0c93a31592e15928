//! WGSL sources for every pipeline.
//!
//! Each constant is a complete shader module built from a shared common
//! block, so the light structs and shading math are byte-identical across
//! the naive, Forward+, and deferred strategies.

macro_rules! with_common {
    ($body:literal) => {
        concat!(
            r#"
struct CameraUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    inv_view: mat4x4<f32>,
    inv_proj: mat4x4<f32>,
    position: vec4<f32>,
    near_far: vec4<f32>,
}

struct ModelUniforms {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialUniforms {
    base_color: vec4<f32>,
}

struct Light {
    position_radius: vec4<f32>,
    color_intensity: vec4<f32>,
}

struct LightSet {
    num_lights: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    lights: array<Light>,
}

struct Cluster {
    light_count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    light_indices: array<u32, 256>,
}

struct ClusterSet {
    dims: vec4<u32>,
    screen: vec4<f32>,
    clusters: array<Cluster>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tangent: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

const AMBIENT: f32 = 0.08;

fn attenuate(distance: f32, radius: f32) -> f32 {
    let falloff = max(0.0, 1.0 - distance / radius);
    return falloff * falloff;
}

fn shade_light(light: Light, world_position: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    let to_light = light.position_radius.xyz - world_position;
    let distance = length(to_light);
    let radius = light.position_radius.w;
    if (distance >= radius) {
        return vec3<f32>(0.0);
    }
    let dir = to_light / max(distance, 1e-4);
    let lambert = max(dot(normal, dir), 0.0);
    return light.color_intensity.xyz * light.color_intensity.w * lambert * attenuate(distance, radius);
}

fn depth_slice(view_z: f32, slices: u32, near: f32, far: f32) -> u32 {
    let ratio = max(view_z, near * 1.0001) / near;
    let s = log(ratio) / log(far / near) * f32(slices);
    return min(u32(max(s, 0.0)), slices - 1u);
}

fn cluster_index_for(frag_xy: vec2<f32>, view_z: f32, dims: vec4<u32>, near: f32, far: f32) -> u32 {
    let tile = f32(dims.w);
    let cx = min(u32(frag_xy.x / tile), dims.x - 1u);
    let cy = min(u32(frag_xy.y / tile), dims.y - 1u);
    let cz = depth_slice(view_z, dims.z, near, far);
    return cx + cy * dims.x + cz * dims.x * dims.y;
}
"#,
            $body
        )
    };
}

/// Forward pass shading every fragment against the full light list.
pub const NAIVE_SHADER: &str = with_common!(
    r#"
@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<storage, read> light_set: LightSet;
@group(1) @binding(0) var<uniform> model: ModelUniforms;
@group(2) @binding(0) var<uniform> material: MaterialUniforms;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world = model.model * vec4<f32>(input.position, 1.0);
    output.world_position = world.xyz;
    output.world_normal = normalize((model.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz);
    output.uv = input.uv;
    output.clip_position = camera.view_proj * world;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.world_normal);
    var radiance = vec3<f32>(AMBIENT);
    for (var i = 0u; i < light_set.num_lights; i = i + 1u) {
        radiance = radiance + shade_light(light_set.lights[i], input.world_position, normal);
    }
    return vec4<f32>(material.base_color.rgb * radiance, material.base_color.a);
}
"#
);

/// Forward pass shading only the lights indexed by the fragment's cluster.
pub const FORWARD_PLUS_SHADER: &str = with_common!(
    r#"
@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<storage, read> light_set: LightSet;
@group(0) @binding(2) var<storage, read> cluster_set: ClusterSet;
@group(1) @binding(0) var<uniform> model: ModelUniforms;
@group(2) @binding(0) var<uniform> material: MaterialUniforms;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world = model.model * vec4<f32>(input.position, 1.0);
    output.world_position = world.xyz;
    output.world_normal = normalize((model.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz);
    output.uv = input.uv;
    output.clip_position = camera.view_proj * world;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.world_normal);
    let view_pos = camera.view * vec4<f32>(input.world_position, 1.0);
    let cluster_index = cluster_index_for(
        input.clip_position.xy,
        -view_pos.z,
        cluster_set.dims,
        camera.near_far.x,
        camera.near_far.y,
    );
    let count = cluster_set.clusters[cluster_index].light_count;
    var radiance = vec3<f32>(AMBIENT);
    for (var i = 0u; i < count; i = i + 1u) {
        let light_index = cluster_set.clusters[cluster_index].light_indices[i];
        radiance = radiance + shade_light(light_set.lights[light_index], input.world_position, normal);
    }
    return vec4<f32>(material.base_color.rgb * radiance, material.base_color.a);
}
"#
);

/// Geometry pass writing world position, world normal, and albedo.
pub const GEOMETRY_SHADER: &str = with_common!(
    r#"
@group(0) @binding(0) var<uniform> model: ModelUniforms;
@group(1) @binding(0) var<uniform> camera: CameraUniforms;
@group(2) @binding(0) var<uniform> material: MaterialUniforms;

struct GBufferOutput {
    @location(0) position: vec4<f32>,
    @location(1) normal: vec4<f32>,
    @location(2) albedo: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world = model.model * vec4<f32>(input.position, 1.0);
    output.world_position = world.xyz;
    output.world_normal = normalize((model.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz);
    output.uv = input.uv;
    output.clip_position = camera.view_proj * world;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> GBufferOutput {
    var output: GBufferOutput;
    output.position = vec4<f32>(input.world_position, 1.0);
    output.normal = vec4<f32>(normalize(input.world_normal), 0.0);
    output.albedo = material.base_color;
    return output;
}
"#
);

/// Full-screen lighting pass reading the G-buffer and the cluster data.
pub const DEFERRED_LIGHTING_SHADER: &str = with_common!(
    r#"
@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<storage, read> light_set: LightSet;
@group(0) @binding(2) var<storage, read> cluster_set: ClusterSet;
@group(0) @binding(3) var position_texture: texture_2d<f32>;
@group(0) @binding(4) var normal_texture: texture_2d<f32>;
@group(0) @binding(5) var albedo_texture: texture_2d<f32>;
@group(0) @binding(6) var gbuffer_sampler: sampler;

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> FullscreenOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
    );
    let p = positions[vertex_index];
    var output: FullscreenOutput;
    output.clip_position = vec4<f32>(p, 0.0, 1.0);
    output.uv = vec2<f32>(0.5 * (p.x + 1.0), 0.5 * (1.0 - p.y));
    return output;
}

@fragment
fn fs_main(input: FullscreenOutput) -> @location(0) vec4<f32> {
    let pixel = vec2<i32>(input.clip_position.xy);
    let albedo = textureSample(albedo_texture, gbuffer_sampler, input.uv);
    let sample_position = textureLoad(position_texture, pixel, 0);
    let sample_normal = textureLoad(normal_texture, pixel, 0).xyz;

    // Cleared texels carry no normal; leave the background at the clear color.
    if (dot(sample_normal, sample_normal) < 0.5) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }

    let world_position = sample_position.xyz;
    let normal = normalize(sample_normal);
    let view_pos = camera.view * vec4<f32>(world_position, 1.0);
    let cluster_index = cluster_index_for(
        input.clip_position.xy,
        -view_pos.z,
        cluster_set.dims,
        camera.near_far.x,
        camera.near_far.y,
    );
    let count = cluster_set.clusters[cluster_index].light_count;
    var radiance = vec3<f32>(AMBIENT);
    for (var i = 0u; i < count; i = i + 1u) {
        let light_index = cluster_set.clusters[cluster_index].light_indices[i];
        radiance = radiance + shade_light(light_set.lights[light_index], world_position, normal);
    }
    return vec4<f32>(albedo.rgb * radiance, 1.0);
}
"#
);

/// Compute pass assigning lights to view-frustum clusters.
pub const CLUSTER_SHADER: &str = with_common!(
    r#"
@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<storage, read> light_set: LightSet;
@group(0) @binding(2) var<storage, read_write> cluster_set: ClusterSet;

fn screen_to_view(pixel: vec2<f32>, screen: vec2<f32>) -> vec3<f32> {
    let ndc = vec2<f32>(pixel.x / screen.x * 2.0 - 1.0, 1.0 - pixel.y / screen.y * 2.0);
    let view = camera.inv_proj * vec4<f32>(ndc, 0.0, 1.0);
    return view.xyz / view.w;
}

@compute @workgroup_size(4, 4, 4)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let dims = cluster_set.dims;
    if (id.x >= dims.x || id.y >= dims.y || id.z >= dims.z) {
        return;
    }

    let near = camera.near_far.x;
    let far = camera.near_far.y;
    let tile = f32(dims.w);
    let screen = cluster_set.screen.xy;

    let min_px = vec2<f32>(f32(id.x), f32(id.y)) * tile;
    let max_px = min(min_px + vec2<f32>(tile, tile), screen);
    let min_ray = screen_to_view(min_px, screen);
    let max_ray = screen_to_view(max_px, screen);

    let z_near = -near * pow(far / near, f32(id.z) / f32(dims.z));
    let z_far = -near * pow(far / near, f32(id.z + 1u) / f32(dims.z));

    let p0 = min_ray * (z_near / min_ray.z);
    let p1 = min_ray * (z_far / min_ray.z);
    let p2 = max_ray * (z_near / max_ray.z);
    let p3 = max_ray * (z_far / max_ray.z);
    let aabb_min = min(min(p0, p1), min(p2, p3));
    let aabb_max = max(max(p0, p1), max(p2, p3));

    let cluster_index = id.x + id.y * dims.x + id.z * dims.x * dims.y;
    var count = 0u;
    for (var i = 0u; i < light_set.num_lights; i = i + 1u) {
        let light = light_set.lights[i];
        let view_pos = (camera.view * vec4<f32>(light.position_radius.xyz, 1.0)).xyz;
        let closest = clamp(view_pos, aabb_min, aabb_max);
        let delta = view_pos - closest;
        let radius = light.position_radius.w;
        if (dot(delta, delta) <= radius * radius && count < 256u) {
            cluster_set.clusters[cluster_index].light_indices[count] = i;
            count = count + 1u;
        }
    }
    cluster_set.clusters[cluster_index].light_count = count;
}
"#
);
