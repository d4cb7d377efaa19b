use tracing::{debug, warn};

use crate::config::DatagenConfig;
use crate::error::{DatagenError, Result};
use crate::field::AmbientField;
use crate::geom::cache::GeometryCache;
use crate::geom::mesh::TetraMesh;
use crate::geom::receivers::ReceiverSet;
use crate::io::{MeshFiles, read_receivers, read_tetgen};

/// Static survey data loaded once per run.
pub struct Survey {
    pub mesh: TetraMesh,
    pub receivers: ReceiverSet,
    pub geometry: GeometryCache,
    pub field: AmbientField,
}

/// Shared read-only view of the survey passed to every sample.
#[derive(Clone, Copy)]
pub struct SurveyContext<'a> {
    pub mesh: &'a TetraMesh,
    pub geometry: &'a GeometryCache,
    pub receivers: &'a ReceiverSet,
    pub field: &'a AmbientField,
}

impl Survey {
    /// Builds a survey from already loaded data, deriving the cell geometry.
    pub fn new(mesh: TetraMesh, receivers: ReceiverSet, field: AmbientField) -> Self {
        let geometry = GeometryCache::from_mesh(&mesh);
        Self {
            mesh,
            receivers,
            geometry,
            field,
        }
    }

    /// Loads mesh and receivers and derives geometry and field direction.
    ///
    /// Any failure here is fatal for the run.
    pub fn load(config: &DatagenConfig) -> Result<Self> {
        let field = config.ambient_field()?;
        debug!(
            magnitude = field.magnitude(),
            direction = %field.direction(),
            "ambient field"
        );

        let mesh_dir = &config.mesh.dir_name;
        if !mesh_dir.is_dir() {
            return Err(DatagenError::FileNotFound {
                path: mesh_dir.clone(),
            });
        }
        debug!("Extracting nodes and elements from mesh");
        let mesh = read_tetgen(mesh_dir, &config.mesh.base_file_name)?;
        debug!(
            nodes = mesh.node_count(),
            cells = mesh.cell_count(),
            "mesh loaded"
        );

        let receivers = read_receivers(&config.receiver_locations_file)?;
        debug!(receivers = receivers.len(), "receivers loaded");

        let survey = Self::new(mesh, receivers, field);
        debug!(
            total_volume = survey.geometry.total_volume(),
            "cell centroids and volumes computed"
        );

        let ele = MeshFiles::new(mesh_dir, &config.mesh.base_file_name).ele;
        survey.check_cells(&ele, config.mesh.strict)?;
        Ok(survey)
    }

    /// Reports degenerate cells, rejecting them in strict mode.
    ///
    /// Degenerate cells are those with a repeated node index or zero volume.
    pub fn check_cells(&self, ele: &std::path::Path, strict: bool) -> Result<()> {
        let repeated = self.mesh.cells_with_repeated_nodes();
        let flat = self.geometry.zero_volume_cells();
        if repeated.is_empty() && flat.is_empty() {
            return Ok(());
        }

        if strict {
            let first = repeated.first().or(flat.first()).copied().unwrap_or_default();
            return Err(DatagenError::malformed_mesh(
                ele,
                format!(
                    "{} cells with repeated nodes and {} cells with zero volume (first: cell {first})",
                    repeated.len(),
                    flat.len()
                ),
            ));
        }
        warn!(
            repeated_nodes = repeated.len(),
            zero_volume = flat.len(),
            "mesh has degenerate cells; their volume is 0"
        );
        Ok(())
    }

    pub fn context(&self) -> SurveyContext<'_> {
        SurveyContext {
            mesh: &self.mesh,
            geometry: &self.geometry,
            receivers: &self.receivers,
            field: &self.field,
        }
    }
}
