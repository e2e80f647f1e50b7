// scene.rs — one inward-facing sphere textured with the live video, seen
// through a perspective camera sitting at its center
//
// The GPU side lives behind `RenderBackend`. Its resource types are
// released on drop, so a scene that goes out of scope, fails halfway
// through construction, or is explicitly `PanoramicScene::dispose`d never
// leaks geometry, textures or materials.

use crate::error::RenderError;
use crate::media::VideoFrame;
use crate::mesh::{build_sphere, SphereMesh, HEIGHT_SEGMENTS, SPHERE_RADIUS, WIDTH_SEGMENTS};
use crate::orientation::OrientationState;

use glam::{EulerRot, Mat4, Quat, Vec3};

pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const MIN_FOV_DEGREES: f32 = 30.0;
pub const MAX_FOV_DEGREES: f32 = 100.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;
/// Keeps the eye just off the exact center of the sphere.
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 0.1);
const ZOOM_STEP_DEGREES: f32 = 2.5;

pub trait RenderBackend {
    type Geometry;
    type Texture;
    type Material;

    fn create_geometry(&mut self, mesh: &SphereMesh) -> Result<Self::Geometry, RenderError>;
    /// A texture that starts blank and is refreshed from video frames.
    fn create_video_texture(&mut self) -> Result<Self::Texture, RenderError>;
    fn create_material(&mut self, texture: &Self::Texture) -> Result<Self::Material, RenderError>;

    /// Copies `frame` into `texture`, rebuilding texture and material when
    /// the frame size changes.
    fn upload_frame(
        &mut self,
        texture: &mut Self::Texture,
        material: &mut Self::Material,
        frame: &VideoFrame,
    ) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Draws one frame and presents it.
    fn render(
        &mut self,
        geometry: &Self::Geometry,
        material: &Self::Material,
        view_projection: Mat4,
    ) -> Result<(), RenderError>;

    /// Removes the renderer's output from its container.
    fn detach(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            aspect,
            near: NEAR_PLANE,
            far: FAR_PLANE,
            position: CAMERA_OFFSET,
            rotation: Quat::IDENTITY,
        }
    }

    /// Yaw about the vertical axis first, then pitch about the horizontal axis.
    pub fn set_orientation(&mut self, orientation: OrientationState) {
        self.rotation = Quat::from_euler(EulerRot::YXZ, orientation.yaw, orientation.pitch, 0.0);
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

pub struct PanoramicScene<B: RenderBackend> {
    camera: PerspectiveCamera,
    size: (u32, u32),
    material: B::Material,
    texture: B::Texture,
    geometry: B::Geometry,
    backend: B,
}

impl<B: RenderBackend> PanoramicScene<B> {
    pub fn new(mut backend: B, width: u32, height: u32) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        let mesh = build_sphere(SPHERE_RADIUS, HEIGHT_SEGMENTS, WIDTH_SEGMENTS);

        let geometry = backend.create_geometry(&mesh)?;
        let texture = backend.create_video_texture()?;
        let material = backend.create_material(&texture)?;
        backend.resize(width, height);

        log::debug!(
            "panoramic scene ready: {} triangles, {width}x{height}",
            mesh.triangle_count()
        );

        Ok(Self {
            camera: PerspectiveCamera::new(width as f32 / height as f32),
            size: (width, height),
            material,
            texture,
            geometry,
            backend,
        })
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Applies a container size change; zero-sized containers are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.camera.aspect = width as f32 / height as f32;
        self.backend.resize(width, height);
    }

    /// Positive `steps` zoom in.
    pub fn zoom(&mut self, steps: f32) {
        self.camera.fov_degrees = (self.camera.fov_degrees - steps * ZOOM_STEP_DEGREES)
            .clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
    }

    pub fn reset_zoom(&mut self) {
        self.camera.fov_degrees = DEFAULT_FOV_DEGREES;
    }

    pub fn update_texture(&mut self, frame: &VideoFrame) -> Result<(), RenderError> {
        self.backend
            .upload_frame(&mut self.texture, &mut self.material, frame)
    }

    pub fn render(&mut self, orientation: OrientationState) -> Result<(), RenderError> {
        self.camera.set_orientation(orientation);
        self.backend
            .render(&self.geometry, &self.material, self.camera.view_projection())
    }

    /// Releases every GPU resource and detaches the output surface.
    pub fn dispose(self) {
        let Self {
            material,
            texture,
            geometry,
            mut backend,
            ..
        } = self;
        drop(material);
        drop(texture);
        drop(geometry);
        backend.detach();
        drop(backend);
        log::debug!("panoramic scene released");
    }
}
