use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QCSpecError {
    #[error("QC specification name must not be empty")]
    EmptyName,
    #[error("QC specification '{0}' has an empty method")]
    EmptyMethod(String),
    #[error("Program '{0}' is not supported (expected one of psi4, rdkit, torchani, xtb, openmm)")]
    UnsupportedProgram(String),
    #[error("Program '{program}' requires a basis set")]
    MissingBasis { program: String },
    #[error("Program '{program}' does not accept the basis '{basis}'")]
    UnexpectedBasis { program: String, basis: String },
    #[error("Method '{method}' is not available in '{program}' (allowed: {allowed})")]
    InvalidMethod {
        program: String,
        method: String,
        allowed: String,
    },
    #[error("Implicit solvent is only supported with psi4, not '{0}'")]
    SolventNotSupported(String),
    #[error("Invalid PCM settings: {0}")]
    InvalidPcm(String),
}

/// Which parts of the wavefunction the QC program should keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavefunctionProtocol {
    #[default]
    None,
    OrbitalsAndEigenvalues,
    OccupationsAndEigenvalues,
    ReturnResults,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcmUnits {
    #[default]
    Angstrom,
    Bohr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcmSolver {
    #[default]
    #[serde(rename = "CPCM")]
    Cpcm,
    #[serde(rename = "IEFPCM")]
    Iefpcm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcmCavity {
    #[default]
    GePol,
}

/// Polarizable continuum model settings for psi4 calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmSettings {
    pub units: PcmUnits,
    pub medium_solver_type: PcmSolver,
    pub medium_solvent: String,
    /// Average area of the cavity surface elements.
    pub cavity_area: f64,
    pub cavity_type: PcmCavity,
}

impl Default for PcmSettings {
    fn default() -> Self {
        Self {
            units: PcmUnits::Angstrom,
            medium_solver_type: PcmSolver::Cpcm,
            medium_solvent: "water".to_string(),
            cavity_area: 0.3,
            cavity_type: PcmCavity::GePol,
        }
    }
}

impl PcmSettings {
    pub fn validate(&self) -> Result<(), QCSpecError> {
        if self.medium_solvent.trim().is_empty() {
            return Err(QCSpecError::InvalidPcm("solvent name must not be empty".into()));
        }
        if !(self.cavity_area > 0.0) {
            return Err(QCSpecError::InvalidPcm(format!(
                "cavity area must be positive, got {}",
                self.cavity_area
            )));
        }
        Ok(())
    }
}

const RDKIT_METHODS: &[&str] = &["uff", "mmff94", "mmff94s"];
const TORCHANI_METHODS: &[&str] = &["ani1x", "ani1ccx", "ani2x"];
const XTB_METHODS: &[&str] = &["gfn0-xtb", "gfn1-xtb", "gfn2-xtb", "gfn-ff"];

/// A named quantum-chemistry calculation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QCSpec {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
    pub program: String,
    pub spec_name: String,
    #[serde(default)]
    pub spec_description: String,
    #[serde(default)]
    pub store_wavefunction: WavefunctionProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_solvent: Option<PcmSettings>,
}

impl Default for QCSpec {
    fn default() -> Self {
        Self {
            method: "B3LYP-D3BJ".to_string(),
            basis: Some("DZVP".to_string()),
            program: "psi4".to_string(),
            spec_name: "default".to_string(),
            spec_description: "Standard OpenFF optimization quantum chemistry specification."
                .to_string(),
            store_wavefunction: WavefunctionProtocol::None,
            implicit_solvent: None,
        }
    }
}

impl QCSpec {
    /// Builds a specification and checks that method, basis, program, and
    /// solvent settings are compatible.
    pub fn new(
        method: impl Into<String>,
        basis: Option<String>,
        program: impl Into<String>,
        spec_name: impl Into<String>,
        spec_description: impl Into<String>,
    ) -> Result<Self, QCSpecError> {
        let mut spec = Self {
            method: method.into(),
            basis,
            program: program.into(),
            spec_name: spec_name.into(),
            spec_description: spec_description.into(),
            store_wavefunction: WavefunctionProtocol::None,
            implicit_solvent: None,
        };
        spec.normalize();
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_wavefunction(mut self, protocol: WavefunctionProtocol) -> Self {
        self.store_wavefunction = protocol;
        self
    }

    pub fn with_implicit_solvent(mut self, pcm: PcmSettings) -> Result<Self, QCSpecError> {
        self.implicit_solvent = Some(pcm);
        self.validate()?;
        Ok(self)
    }

    /// Lower-cases the program, and the method for programs with a fixed
    /// method list. openmm specifications get the `smirnoff` basis when none
    /// is given; empty basis strings become `None`.
    pub fn normalize(&mut self) {
        self.program = self.program.trim().to_ascii_lowercase();
        if matches!(self.program.as_str(), "rdkit" | "torchani" | "xtb") {
            self.method = self.method.trim().to_ascii_lowercase();
        }
        if self.basis.as_deref().is_some_and(|b| b.trim().is_empty()) {
            self.basis = None;
        }
        if self.program == "openmm" && self.basis.is_none() {
            self.basis = Some("smirnoff".to_string());
        }
    }

    pub fn validate(&self) -> Result<(), QCSpecError> {
        if self.spec_name.trim().is_empty() {
            return Err(QCSpecError::EmptyName);
        }
        if self.method.trim().is_empty() {
            return Err(QCSpecError::EmptyMethod(self.spec_name.clone()));
        }

        let program = self.program.as_str();
        let fixed_methods = match program {
            "psi4" => {
                if self.basis.is_none() {
                    return Err(QCSpecError::MissingBasis {
                        program: program.to_string(),
                    });
                }
                None
            }
            "rdkit" => Some(RDKIT_METHODS),
            "torchani" => Some(TORCHANI_METHODS),
            "xtb" => Some(XTB_METHODS),
            "openmm" => {
                if !self.method.ends_with(".offxml") {
                    return Err(QCSpecError::InvalidMethod {
                        program: program.to_string(),
                        method: self.method.clone(),
                        allowed: "a force field file ending in .offxml".to_string(),
                    });
                }
                match self.basis.as_deref() {
                    Some(b) if b.eq_ignore_ascii_case("smirnoff") => {}
                    other => {
                        return Err(QCSpecError::UnexpectedBasis {
                            program: program.to_string(),
                            basis: other.unwrap_or_default().to_string(),
                        });
                    }
                }
                None
            }
            other => return Err(QCSpecError::UnsupportedProgram(other.to_string())),
        };

        if let Some(methods) = fixed_methods {
            if !methods.contains(&self.method.as_str()) {
                return Err(QCSpecError::InvalidMethod {
                    program: program.to_string(),
                    method: self.method.clone(),
                    allowed: methods.join(", "),
                });
            }
            if let Some(basis) = &self.basis {
                return Err(QCSpecError::UnexpectedBasis {
                    program: program.to_string(),
                    basis: basis.clone(),
                });
            }
        }

        if let Some(pcm) = &self.implicit_solvent {
            if program != "psi4" {
                return Err(QCSpecError::SolventNotSupported(program.to_string()));
            }
            pcm.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for QCSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.spec_name, self.program)?;
        write!(f, "/{}", self.method)?;
        if let Some(basis) = &self.basis {
            write!(f, "/{basis}")?;
        }
        if self.implicit_solvent.is_some() {
            write!(f, " (PCM)")?;
        }
        Ok(())
    }
}
