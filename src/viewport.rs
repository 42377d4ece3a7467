use eframe::egui::{self, Color32, Pos2, Rect, Shape, Stroke, Vec2};
use nalgebra::{Perspective3, Point3, Rotation3, Vector3};

const BACKGROUND: Color32 = Color32::WHITE;

const CAMERA_FOV_DEG: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;
const CAMERA_Z: f32 = 5.0;

const SOLID_SIZE: [f32; 3] = [5.0, 1.0, 4.0];

/// Face colours in +x, -x, +y, -y, +z, -z order.
const FACE_COLORS: [Color32; 6] = [
    Color32::from_rgb(0x03, 0x04, 0x5e),
    Color32::from_rgb(0x02, 0x3e, 0x8a),
    Color32::from_rgb(0x00, 0x77, 0xb6),
    Color32::from_rgb(0x03, 0x04, 0x5e),
    Color32::from_rgb(0x02, 0x3e, 0x8a),
    Color32::from_rgb(0x00, 0x77, 0xb6),
];

/// Euler angles in radians, applied in X, Y, Z order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub fn to_rotation(self) -> Rotation3<f32> {
        Rotation3::from_axis_angle(&Vector3::x_axis(), self.x)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.y)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.z)
    }
}

/// Camera at a fixed position looking down -z.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Point3<f32>,
    projection: Perspective3<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let fov_y = fov_y_deg.to_radians();
        Self {
            fov_y,
            aspect,
            near,
            far,
            position: Point3::origin(),
            projection: Perspective3::new(aspect, fov_y, near, far),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Perspective3::new(self.aspect, self.fov_y, self.near, self.far);
    }

    fn to_view(&self, p: &Point3<f32>) -> Point3<f32> {
        p - self.position.coords
    }

    fn project(&self, view: &Point3<f32>) -> Point3<f32> {
        self.projection.project_point(view)
    }
}

/// Box mesh with one flat colour per face.
#[derive(Debug, Clone)]
pub struct Solid {
    half_extents: Vector3<f32>,
    face_colors: [Color32; 6],
    pub rotation: Euler,
}

struct Face {
    corners: [Point3<f32>; 4],
    normal: Vector3<f32>,
    color: Color32,
}

impl Solid {
    pub fn new(size: [f32; 3], face_colors: [Color32; 6]) -> Self {
        Self {
            half_extents: Vector3::from(size) * 0.5,
            face_colors,
            rotation: Euler::default(),
        }
    }

    fn faces(&self) -> Vec<Face> {
        let rotation = self.rotation.to_rotation();
        let he = self.half_extents;

        (0..6)
            .map(|i| {
                let axis = i / 2;
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                let u = (axis + 1) % 3;
                let v = (axis + 2) % 3;

                let corner = |su: f32, sv: f32| {
                    let mut p = Vector3::zeros();
                    p[axis] = sign * he[axis];
                    p[u] = su * he[u];
                    p[v] = sv * he[v];
                    Point3::from(rotation * p)
                };
                let mut normal = Vector3::zeros();
                normal[axis] = sign;

                Face {
                    corners: [
                        corner(-1.0, -1.0),
                        corner(1.0, -1.0),
                        corner(1.0, 1.0),
                        corner(-1.0, 1.0),
                    ],
                    normal: rotation * normal,
                    color: self.face_colors[i],
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color32,
    pub solid: Solid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFace {
    /// Corners in normalized device coordinates.
    pub points: Vec<[f32; 2]>,
    pub color: Color32,
}

/// Output of the last render pass, faces ordered back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub background: Color32,
    pub faces: Vec<ProjectedFace>,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    size: Vec2,
    frame: Option<RenderedFrame>,
    frames_rendered: u64,
}

impl Renderer {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            frame: None,
            frames_rendered: 0,
        }
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[cfg(test)]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frame(&self) -> Option<&RenderedFrame> {
        self.frame.as_ref()
    }

    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        let mut faces: Vec<(f32, ProjectedFace)> = scene
            .solid
            .faces()
            .into_iter()
            .filter_map(|face| {
                let view: Vec<Point3<f32>> = face.corners.iter().map(|c| camera.to_view(c)).collect();
                let center = view.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / 4.0;

                // back faces and faces seen edge-on are culled
                if face.normal.dot(&center) >= 0.0 {
                    return None;
                }

                let points = view
                    .iter()
                    .map(|p| {
                        let ndc = camera.project(p);
                        [ndc.x, ndc.y]
                    })
                    .collect();
                Some((
                    center.z,
                    ProjectedFace {
                        points,
                        color: face.color,
                    },
                ))
            })
            .collect();

        faces.sort_by(|a, b| a.0.total_cmp(&b.0));

        self.frame = Some(RenderedFrame {
            background: scene.background,
            faces: faces.into_iter().map(|(_, face)| face).collect(),
        });
        self.frames_rendered += 1;
        log::trace!("rendered frame {}", self.frames_rendered);
    }

    /// Paints the last rendered frame into `rect`.
    pub fn paint(&self, painter: &egui::Painter, rect: Rect) {
        let Some(frame) = self.frame() else {
            return;
        };

        painter.rect_filled(rect, 0.0, frame.background);

        let to_screen = |[x, y]: [f32; 2]| {
            Pos2::new(
                rect.min.x + (x + 1.0) * 0.5 * rect.width(),
                rect.min.y + (1.0 - y) * 0.5 * rect.height(),
            )
        };

        for face in &frame.faces {
            let mut points: Vec<Pos2> = face.points.iter().copied().map(to_screen).collect();
            if signed_area(&points) < 0.0 {
                points.reverse();
            }
            painter.add(Shape::convex_polygon(points, face.color, Stroke::NONE));
        }
    }
}

fn signed_area(points: &[Pos2]) -> f32 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f32>()
        * 0.5
}

/// 3D view of the device orientation bound to a container area.
#[derive(Debug, Clone)]
pub struct Viewport {
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: Renderer,
}

impl Viewport {
    pub fn new(container: Vec2) -> Self {
        let scene = Scene {
            background: BACKGROUND,
            solid: Solid::new(SOLID_SIZE, FACE_COLORS),
        };

        let mut camera = PerspectiveCamera::new(
            CAMERA_FOV_DEG,
            container.x / container.y,
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        camera.position.z = CAMERA_Z;

        let mut renderer = Renderer::new(container);
        renderer.render(&scene, &camera);

        Self {
            scene,
            camera,
            renderer,
        }
    }

    /// Tracks the container size. The next orientation update redraws.
    pub fn on_resize(&mut self, container: Vec2) {
        self.camera.aspect = container.x / container.y;
        self.camera.update_projection_matrix();
        self.renderer.set_size(container);
    }

    pub fn apply_orientation(&mut self, rotation: Euler) {
        self.scene.solid.rotation = rotation;
        self.renderer.render(&self.scene, &self.camera);
    }

    pub fn rotation(&self) -> Euler {
        self.scene.solid.rotation
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        self.renderer.paint(&painter, response.rect);
    }
}
