use crate::core::chem::perception::rotatable_bonds;
use crate::core::models::molecule::Molecule;
use crate::engine::component::{ComponentProperties, Processed, WorkflowComponent};
use crate::engine::error::WorkflowError;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Removes molecules with too many (or too few) rotatable bonds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotorFilter {
    pub maximum_rotors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_rotors: Option<usize>,
}

impl Default for RotorFilter {
    fn default() -> Self {
        Self {
            maximum_rotors: 4,
            minimum_rotors: None,
        }
    }
}

impl WorkflowComponent for RotorFilter {
    fn name(&self) -> &'static str {
        "RotorFilter"
    }

    fn description(&self) -> &'static str {
        "Filter molecules by their number of rotatable bonds."
    }

    fn fail_reason(&self) -> &'static str {
        "The number of rotatable bonds was outside the allowed range."
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            process_parallel: true,
            produces_duplicates: false,
        }
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        match self.minimum_rotors {
            Some(min) if min > self.maximum_rotors => Err(WorkflowError::invalid_settings(
                self.name(),
                format!(
                    "minimum_rotors ({min}) is greater than maximum_rotors ({})",
                    self.maximum_rotors
                ),
            )),
            _ => Ok(()),
        }
    }

    fn process(&self, molecule: Molecule) -> Processed {
        let n_rotors = rotatable_bonds(&molecule).len();
        trace!(name = %molecule.name, n_rotors, "Counted rotatable bonds");
        let minimum = self.minimum_rotors.unwrap_or(0);
        if (minimum..=self.maximum_rotors).contains(&n_rotors) {
            Processed::pass(molecule)
        } else {
            Processed::Filtered(molecule)
        }
    }
}
