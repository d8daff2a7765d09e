//! The simulation façade: one cloth, one integrator.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use weft_contact::{Collider, ColliderSet};
use weft_math::Vec3;
use weft_mesh::generators::grid_from_spec;
use weft_mesh::obj::from_obj_file;
use weft_mesh::{ClothMesh, GridSpec};
use weft_types::{WeftError, WeftResult};

use crate::config::SimulationConfig;
use crate::euler::EulerIntegrator;
use crate::implicit_newton::ImplicitNewtonIntegrator;
use crate::position_based::PositionBasedIntegrator;
use crate::projective_dynamics::ProjectiveDynamicsIntegrator;
use crate::strategy::{ClothIntegrator, StepResult};

/// Default surface model used by the `tshirt` shape.
pub const DEFAULT_SURFACE_PATH: &str = "Mesh/tshirt.obj";

/// Time integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    ExplicitEuler,
    SymplecticEuler,
    Pbd,
    Xpbd,
    ProjectiveDynamics,
    ImplicitNewton,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::ExplicitEuler,
        Method::SymplecticEuler,
        Method::Pbd,
        Method::Xpbd,
        Method::ProjectiveDynamics,
        Method::ImplicitNewton,
    ];

    /// Display name, also accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Method::ExplicitEuler => "ExplicitEuler",
            Method::SymplecticEuler => "SymplecticEuler",
            Method::Pbd => "PBD",
            Method::Xpbd => "XPBD",
            Method::ProjectiveDynamics => "ProjectiveDynamics",
            Method::ImplicitNewton => "ImplicitNewton",
        }
    }

    /// Builds an unprepared integrator for this method.
    pub fn integrator(self, config: &SimulationConfig) -> Box<dyn ClothIntegrator> {
        match self {
            Method::ExplicitEuler => Box::new(EulerIntegrator::explicit(&config.explicit_euler)),
            Method::SymplecticEuler => {
                Box::new(EulerIntegrator::symplectic(&config.symplectic_euler))
            }
            Method::Pbd => Box::new(PositionBasedIntegrator::pbd(&config.pbd)),
            Method::Xpbd => Box::new(PositionBasedIntegrator::xpbd(&config.xpbd)),
            Method::ProjectiveDynamics => Box::new(ProjectiveDynamicsIntegrator::new(
                &config.projective_dynamics,
            )),
            Method::ImplicitNewton => {
                Box::new(ImplicitNewtonIntegrator::new(&config.implicit_newton))
            }
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = WeftError;

    /// Accepts the display name (`"PBD"`, `"ImplicitNewton"`) or the
    /// snake_case form (`"pbd"`, `"implicit_newton"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(&key))
            .ok_or_else(|| WeftError::UnknownMethod(s.to_string()))
    }
}

/// Where the cloth comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClothModel {
    Grid(GridSpec),
    Surface { path: PathBuf },
}

impl Default for ClothModel {
    fn default() -> Self {
        ClothModel::Grid(GridSpec::default())
    }
}

impl ClothModel {
    /// Builds a fresh cloth. An unreadable surface file yields an empty cloth.
    pub fn build(&self) -> ClothMesh {
        match self {
            ClothModel::Grid(spec) => grid_from_spec(spec),
            ClothModel::Surface { path } => from_obj_file(path),
        }
    }
}

impl FromStr for ClothModel {
    type Err = WeftError;

    /// `grid`, `tshirt`, or a path to a `.obj` file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(ClothModel::Grid(GridSpec::default())),
            "tshirt" => Ok(ClothModel::Surface {
                path: PathBuf::from(DEFAULT_SURFACE_PATH),
            }),
            path if path.to_ascii_lowercase().ends_with(".obj") => Ok(ClothModel::Surface {
                path: PathBuf::from(path),
            }),
            other => Err(WeftError::InvalidConfig(format!(
                "unknown cloth shape '{other}' (expected grid, tshirt or an .obj path)"
            ))),
        }
    }
}

/// A cloth paired with the integrator that advances it.
///
/// Renderers read [`cloth`](Self::cloth) after each [`update`](Self::update)
/// and [`compute_normals`](Self::compute_normals).
pub struct ClothInstance {
    model: ClothModel,
    method: Method,
    config: SimulationConfig,
    cloth: ClothMesh,
    integrator: Box<dyn ClothIntegrator>,
    frame: u64,
}

impl ClothInstance {
    /// Builds the cloth and a prepared integrator.
    pub fn new(model: ClothModel, method: Method, config: SimulationConfig) -> WeftResult<Self> {
        config.validate()?;
        let mut cloth = model.build();
        let mut integrator = method.integrator(&config);
        integrator.prepare(&mut cloth)?;

        let stats = cloth.stats();
        tracing::info!(
            method = %method,
            nodes = stats.nodes,
            triangles = stats.triangles,
            springs = stats.springs,
            pinned = stats.pinned,
            "cloth instance created"
        );

        Ok(Self {
            model,
            method,
            config,
            cloth,
            integrator,
            frame: 0,
        })
    }

    /// Builds from a shape name (`grid`, `tshirt`, `*.obj`) and a method
    /// name with default parameters.
    pub fn create(shape: &str, method: &str) -> WeftResult<Self> {
        Self::new(shape.parse()?, method.parse()?, SimulationConfig::default())
    }

    /// Advances the cloth by one frame.
    pub fn update(&mut self) -> WeftResult<StepResult> {
        let result = self.integrator.update(&mut self.cloth)?;
        self.frame += 1;
        Ok(result)
    }

    /// Releases every pinned node, the way the current method does it.
    pub fn unpin(&mut self) {
        self.integrator.unpin(&mut self.cloth);
    }

    pub fn compute_normals(&mut self) {
        self.cloth.compute_normals();
    }

    /// Puts the cloth back to its initial state and re-pins the anchors.
    /// Colliders and the prepared integrator are kept.
    pub fn restart(&mut self) {
        self.cloth.restart();
        self.frame = 0;
    }

    /// Builds a new cloth and integrator from the current model, method and
    /// configuration. All colliders are dropped.
    pub fn rebuild(&mut self) -> WeftResult<()> {
        let mut cloth = self.model.build();
        let mut integrator = self.method.integrator(&self.config);
        integrator.prepare(&mut cloth)?;
        self.cloth = cloth;
        self.integrator = integrator;
        self.frame = 0;
        tracing::info!(method = %self.method, nodes = self.cloth.node_count(), "cloth instance rebuilt");
        Ok(())
    }

    /// Switches model and/or method, then rebuilds.
    pub fn rebuild_with(&mut self, model: ClothModel, method: Method) -> WeftResult<()> {
        self.model = model;
        self.method = method;
        self.rebuild()
    }

    pub fn cloth(&self) -> &ClothMesh {
        &self.cloth
    }

    pub fn cloth_mut(&mut self) -> &mut ClothMesh {
        &mut self.cloth
    }

    pub fn add_collider(&mut self, collider: Box<dyn Collider>) {
        self.integrator.add_collider(collider);
    }

    pub fn colliders(&self) -> &ColliderSet {
        self.integrator.colliders()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn model(&self) -> &ClothModel {
        &self.model
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Frames advanced since the last build or restart.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// World-space node positions.
    pub fn world_positions(&self) -> Vec<Vec3> {
        let origin = self.cloth.origin;
        self.cloth.nodes.iter().map(|n| origin + n.position).collect()
    }
}

impl fmt::Debug for ClothInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClothInstance")
            .field("model", &self.model)
            .field("method", &self.method)
            .field("nodes", &self.cloth.node_count())
            .field("colliders", self.integrator.colliders())
            .field("frame", &self.frame)
            .finish()
    }
}
