//! YAML configuration of a dataset generation run.

use crate::error::{DatagenError, Result};
use crate::field::AmbientField;
use crate::sim::batch::{BatchOptions, SampleErrorPolicy};
use crate::sim::kernel::KernelFlags;
use crate::sim::sample::NpySampleLoader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default exported symbol of the native field kernel.
pub const DEFAULT_KERNEL_SYMBOL: &str = "calc_and_mig_field";

/// Complete run configuration loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatagenConfig {
    /// Ambient field x component (nT)
    #[serde(rename = "Bx")]
    pub bx: f64,
    /// Ambient field y component (nT)
    #[serde(rename = "By")]
    pub by: f64,
    /// Ambient field z component (nT)
    #[serde(rename = "Bz")]
    pub bz: f64,
    /// Mesh location
    pub mesh: MeshConfig,
    /// Receiver locations CSV
    #[serde(rename = "reciever_locations_file", alias = "receiver_locations_file")]
    pub receiver_locations_file: PathBuf,
    /// Model sample files
    pub model: ModelConfig,
    /// Number of samples, processed as indices `0..n_samp`
    pub n_samp: usize,
    /// Scale susceptibility by the ambient field magnitude
    pub ismag: bool,
    /// Tensor mode flag passed through to the kernel
    pub istensor: bool,
    /// Worker threads for the batch (1 = sequential)
    #[serde(default = "default_n_cpu")]
    pub n_cpu: usize,
    /// What to do when a single sample fails
    #[serde(default)]
    pub on_sample_error: SampleErrorPolicy,
    /// Native kernel location
    #[serde(default)]
    pub kernel: KernelConfig,
}

/// Mesh location and validation mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    pub dir_name: PathBuf,
    pub base_file_name: String,
    /// Reject cells with repeated nodes or zero volume
    #[serde(default)]
    pub strict: bool,
}

/// Location and naming of per-sample model arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub dir_name: PathBuf,
    pub sus_name_prefix: String,
    pub kx_name_prefix: String,
    pub ky_name_prefix: String,
    pub kz_name_prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Native kernel library and symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            library: None,
            symbol: default_symbol(),
        }
    }
}

fn default_n_cpu() -> usize {
    1
}

fn default_extension() -> String {
    "npy".to_string()
}

fn default_symbol() -> String {
    DEFAULT_KERNEL_SYMBOL.to_string()
}

impl DatagenConfig {
    /// Loads and validates a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DatagenError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| DatagenError::io(path, e))?;
        Self::parse_at(path, &content)
    }

    /// Parses and validates a configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        Self::parse_at(Path::new("<string>"), yaml)
    }

    fn parse_at(path: &Path, yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| DatagenError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|reason| DatagenError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.n_cpu == 0 {
            return Err("n_cpu must be at least 1".to_string());
        }
        if self.mesh.base_file_name.trim().is_empty() {
            return Err("mesh.base_file_name is empty".to_string());
        }
        let prefixes = [
            ("model.sus_name_prefix", &self.model.sus_name_prefix),
            ("model.kx_name_prefix", &self.model.kx_name_prefix),
            ("model.ky_name_prefix", &self.model.ky_name_prefix),
            ("model.kz_name_prefix", &self.model.kz_name_prefix),
        ];
        if let Some((key, _)) = prefixes.iter().find(|(_, p)| p.is_empty()) {
            return Err(format!("{key} is empty"));
        }
        if self.model.extension.is_empty() {
            return Err("model.extension is empty".to_string());
        }
        Ok(())
    }

    /// Ambient field built from `Bx`, `By`, `Bz`.
    pub fn ambient_field(&self) -> Result<AmbientField> {
        AmbientField::new(self.bx, self.by, self.bz)
    }

    /// Batch options derived from sample count, mode flags and worker count.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            sample_count: self.n_samp,
            flags: KernelFlags {
                magnetic: self.ismag,
                tensor: self.istensor,
            },
            workers: self.n_cpu,
            on_error: self.on_sample_error,
        }
    }

    /// Loader for the per-sample `.npy` property files.
    pub fn sample_loader(&self) -> NpySampleLoader {
        NpySampleLoader {
            dir: self.model.dir_name.clone(),
            sus_prefix: self.model.sus_name_prefix.clone(),
            kx_prefix: self.model.kx_name_prefix.clone(),
            ky_prefix: self.model.ky_name_prefix.clone(),
            kz_prefix: self.model.kz_name_prefix.clone(),
            extension: self.model.extension.clone(),
        }
    }
}
