//! Integrator and scene configuration.
//!
//! One table per integration method. Every struct is `#[serde(default)]`, so
//! a TOML file only needs the values it changes:
//!
//! ```toml
//! [projective_dynamics]
//! time_step = 0.005
//!
//! [projective_dynamics.stiffness]
//! bending = 2000.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use weft_contact::{
    BoxCollider, CapsuleCollider, Collider, GroundPlane, SphereCollider, SphereMeshCollider,
    SweptSphereCollider, SweptSphereTriCollider,
};
use weft_math::Vec3;
use weft_mesh::SpringKind;
use weft_types::constants::GRAVITY;
use weft_types::{WeftError, WeftResult};

use crate::instance::{ClothModel, Method};

/// Per-kind spring coefficient: a stiffness, or a compliance for XPBD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringCoefficients {
    pub structural: f32,
    pub shear: f32,
    pub bending: f32,
}

impl SpringCoefficients {
    pub const fn new(structural: f32, shear: f32, bending: f32) -> Self {
        Self {
            structural,
            shear,
            bending,
        }
    }

    /// Coefficient for springs of `kind`. Both shear diagonals share one value.
    pub fn for_kind(&self, kind: SpringKind) -> f32 {
        match kind {
            SpringKind::Structural => self.structural,
            SpringKind::ShearA | SpringKind::ShearB => self.shear,
            SpringKind::Bending => self.bending,
        }
    }
}

impl Default for SpringCoefficients {
    fn default() -> Self {
        Self::new(1000.0, 50.0, 400.0)
    }
}

const EULER_SUBSTEPS: u32 = 25;
const PBD_SUBSTEPS: u32 = 25;

/// Forward Euler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitEulerConfig {
    pub time_step: f32,
    pub substeps: u32,
    /// Applied per substep as is. The default is gravity divided by the
    /// substep count.
    pub gravity: Vec3,
    pub stiffness: SpringCoefficients,
}

impl Default for ExplicitEulerConfig {
    fn default() -> Self {
        Self {
            time_step: 0.001,
            substeps: EULER_SUBSTEPS,
            gravity: Vec3::new(0.0, -GRAVITY / EULER_SUBSTEPS as f32, 0.0),
            stiffness: SpringCoefficients::default(),
        }
    }
}

/// Semi-implicit Euler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymplecticEulerConfig {
    pub time_step: f32,
    pub substeps: u32,
    pub gravity: Vec3,
    pub stiffness: SpringCoefficients,
}

impl Default for SymplecticEulerConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            substeps: EULER_SUBSTEPS,
            gravity: Vec3::new(0.0, -GRAVITY / EULER_SUBSTEPS as f32, 0.0),
            stiffness: SpringCoefficients::default(),
        }
    }
}

/// Plain position-based dynamics: rigid constraints, no bending springs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbdConfig {
    pub time_step: f32,
    pub substeps: u32,
    pub gravity: Vec3,
}

impl Default for PbdConfig {
    fn default() -> Self {
        Self {
            time_step: (1.0 / 60.0) / PBD_SUBSTEPS as f32,
            substeps: PBD_SUBSTEPS,
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
        }
    }
}

/// Extended position-based dynamics with per-kind compliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpbdConfig {
    pub time_step: f32,
    pub substeps: u32,
    pub gravity: Vec3,
    pub compliance: SpringCoefficients,
}

impl Default for XpbdConfig {
    fn default() -> Self {
        Self {
            time_step: (1.0 / 60.0) / PBD_SUBSTEPS as f32,
            substeps: PBD_SUBSTEPS,
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            compliance: SpringCoefficients::new(1e-4, 0.3, 1e-4),
        }
    }
}

/// Projective dynamics with a prefactored global matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectiveDynamicsConfig {
    pub time_step: f32,
    /// Local/global iterations per update.
    pub iterations: u32,
    /// Relative change below which the local/global loop stops early.
    pub tolerance: f64,
    pub gravity: Vec3,
    pub stiffness: SpringCoefficients,
    /// Weight of the penalty pulling resolved contacts back into the solve.
    pub collision_stiffness: f32,
}

impl Default for ProjectiveDynamicsConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            iterations: 1,
            tolerance: 1e-6,
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            stiffness: SpringCoefficients::new(10000.0, 500.0, 4000.0),
            collision_stiffness: 10000.0,
        }
    }
}

/// Implicit Euler solved with Newton's method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImplicitNewtonConfig {
    pub time_step: f32,
    pub max_iterations: u32,
    /// Residual norm below which Newton stops.
    pub tolerance: f64,
    pub gravity: Vec3,
    pub stiffness: SpringCoefficients,
}

impl Default for ImplicitNewtonConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            max_iterations: 1,
            tolerance: 1e-5,
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            stiffness: SpringCoefficients::default(),
        }
    }
}

/// Parameters for every integration method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub explicit_euler: ExplicitEulerConfig,
    pub symplectic_euler: SymplecticEulerConfig,
    pub pbd: PbdConfig,
    pub xpbd: XpbdConfig,
    pub projective_dynamics: ProjectiveDynamicsConfig,
    pub implicit_newton: ImplicitNewtonConfig,
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(text: &str) -> WeftResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| WeftError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> WeftResult<String> {
        toml::to_string_pretty(self).map_err(|e| WeftError::InvalidConfig(e.to_string()))
    }

    /// Checks that every time step is positive and every loop runs at least once.
    pub fn validate(&self) -> WeftResult<()> {
        let steps = [
            ("explicit_euler", self.explicit_euler.time_step, self.explicit_euler.substeps),
            ("symplectic_euler", self.symplectic_euler.time_step, self.symplectic_euler.substeps),
            ("pbd", self.pbd.time_step, self.pbd.substeps),
            ("xpbd", self.xpbd.time_step, self.xpbd.substeps),
            (
                "projective_dynamics",
                self.projective_dynamics.time_step,
                self.projective_dynamics.iterations,
            ),
            (
                "implicit_newton",
                self.implicit_newton.time_step,
                self.implicit_newton.max_iterations,
            ),
        ];
        for (table, dt, count) in steps {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(WeftError::InvalidConfig(format!(
                    "{table}: time_step must be positive, got {dt}"
                )));
            }
            if count == 0 {
                return Err(WeftError::InvalidConfig(format!(
                    "{table}: substep/iteration count must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

/// A collider description. Omitted fields take the collider's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderSpec {
    Sphere {
        center: Option<Vec3>,
        radius: Option<f32>,
    },
    Capsule {
        top: Option<Vec3>,
        bottom: Option<Vec3>,
        radius: Option<f32>,
    },
    Box {
        center: Option<Vec3>,
        half_extents: Option<Vec3>,
    },
    Ground {
        height: Option<f32>,
    },
    SweptSphere {
        center1: Option<Vec3>,
        radius1: Option<f32>,
        center2: Option<Vec3>,
        radius2: Option<f32>,
    },
    SweptSphereTriangle {
        centers: Option<[Vec3; 3]>,
        radii: Option<[f32; 3]>,
    },
    SphereMesh {
        path: PathBuf,
        scale: Option<f32>,
        translation: Option<Vec3>,
    },
}

impl ColliderSpec {
    /// The default collider of a kind, by its short name
    /// (`sphere`, `capsule`, `box`, `ground`, `swept_sphere`, `swept_sphere_triangle`).
    pub fn default_of(kind: &str) -> WeftResult<Self> {
        let spec = match kind {
            "sphere" => Self::Sphere {
                center: None,
                radius: None,
            },
            "capsule" => Self::Capsule {
                top: None,
                bottom: None,
                radius: None,
            },
            "box" | "aabb" => Self::Box {
                center: None,
                half_extents: None,
            },
            "ground" => Self::Ground { height: None },
            "swept_sphere" => Self::SweptSphere {
                center1: None,
                radius1: None,
                center2: None,
                radius2: None,
            },
            "swept_sphere_triangle" => Self::SweptSphereTriangle {
                centers: None,
                radii: None,
            },
            other => {
                return Err(WeftError::InvalidConfig(format!(
                    "unknown collider kind '{other}'"
                )))
            }
        };
        Ok(spec)
    }

    /// Builds the collider. Capsule geometry errors are returned as
    /// [`WeftError::Geometry`].
    pub fn build(&self) -> WeftResult<Box<dyn Collider>> {
        let collider: Box<dyn Collider> = match self {
            Self::Sphere { center, radius } => {
                let d = SphereCollider::default();
                Box::new(SphereCollider::new(
                    center.unwrap_or(d.center),
                    radius.unwrap_or(d.radius),
                ))
            }
            Self::Capsule {
                top,
                bottom,
                radius,
            } => {
                let d = CapsuleCollider::default();
                Box::new(CapsuleCollider::new(
                    top.unwrap_or(d.top()),
                    bottom.unwrap_or(d.bottom()),
                    radius.unwrap_or(d.radius()),
                )?)
            }
            Self::Box {
                center,
                half_extents,
            } => {
                let d = BoxCollider::default();
                Box::new(BoxCollider::new(
                    center.unwrap_or(d.center),
                    half_extents.unwrap_or(d.half_extents),
                ))
            }
            Self::Ground { height } => {
                Box::new(GroundPlane::new(height.unwrap_or(GroundPlane::default().height)))
            }
            Self::SweptSphere {
                center1,
                radius1,
                center2,
                radius2,
            } => {
                let d = SweptSphereCollider::default();
                Box::new(SweptSphereCollider::new(
                    center1.unwrap_or(d.center1),
                    radius1.unwrap_or(d.radius1),
                    center2.unwrap_or(d.center2),
                    radius2.unwrap_or(d.radius2),
                ))
            }
            Self::SweptSphereTriangle { centers, radii } => {
                let d = SweptSphereTriCollider::default();
                let [c1, c2, c3] = centers.unwrap_or(d.centers());
                let [r1, r2, r3] = radii.unwrap_or(d.radii());
                Box::new(SweptSphereTriCollider::new(c1, r1, c2, r2, c3, r3))
            }
            Self::SphereMesh {
                path,
                scale,
                translation,
            } => Box::new(SphereMeshCollider::load_with(
                path,
                scale.unwrap_or(weft_contact::sphere_mesh::DEFAULT_SPHERE_MESH_SCALE),
                translation.unwrap_or(weft_contact::sphere_mesh::DEFAULT_SPHERE_MESH_TRANSLATION),
            )),
        };
        Ok(collider)
    }
}

/// A complete headless scene: what to simulate, how, and against what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub model: ClothModel,
    pub method: Method,
    pub frames: u32,
    /// Release the pins after this many frames.
    pub unpin_after: Option<u32>,
    pub colliders: Vec<ColliderSpec>,
    pub simulation: SimulationConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model: ClothModel::default(),
            method: Method::SymplecticEuler,
            frames: 120,
            unpin_after: None,
            colliders: Vec::new(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_toml(text: &str) -> WeftResult<Self> {
        let scene: Self =
            toml::from_str(text).map_err(|e| WeftError::InvalidConfig(e.to_string()))?;
        scene.simulation.validate()?;
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> WeftResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }
}
