use crate::core::models::molecule::Molecule;
use crate::engine::component::{ComponentProperties, Processed, WorkflowComponent};
use crate::engine::error::WorkflowError;
use serde::{Deserialize, Serialize};

/// Keeps molecules whose molecular weight (Da) lies strictly between the bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MolecularWeightFilter {
    pub minimum_weight: f64,
    pub maximum_weight: f64,
}

impl Default for MolecularWeightFilter {
    fn default() -> Self {
        Self {
            minimum_weight: 130.0,
            maximum_weight: 781.0,
        }
    }
}

impl WorkflowComponent for MolecularWeightFilter {
    fn name(&self) -> &'static str {
        "MolecularWeightFilter"
    }

    fn description(&self) -> &'static str {
        "Filter out molecules whose molecular weight is outside the given range."
    }

    fn fail_reason(&self) -> &'static str {
        "The molecular weight was outside the allowed range."
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            process_parallel: true,
            produces_duplicates: false,
        }
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        let (min, max) = (self.minimum_weight, self.maximum_weight);
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(WorkflowError::invalid_settings(
                self.name(),
                format!("weights must be finite and non-negative (got {min} and {max})"),
            ));
        }
        if min >= max {
            return Err(WorkflowError::invalid_settings(
                self.name(),
                format!("minimum_weight ({min}) must be below maximum_weight ({max})"),
            ));
        }
        Ok(())
    }

    fn process(&self, molecule: Molecule) -> Processed {
        let weight = molecule.molecular_weight();
        if self.minimum_weight < weight && weight < self.maximum_weight {
            Processed::pass(molecule)
        } else {
            Processed::Filtered(molecule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::ProgressReporter;

    #[test]
    fn keeps_molecules_inside_the_default_window() {
        // methane 16, benzoic acid 122, ibuprofen 206
        let molecules = ["C", "OC(=O)c1ccccc1", "CC(C)Cc1ccc(cc1)C(C)C(=O)O"]
            .iter()
            .map(|s| Molecule::from_smiles(s).unwrap())
            .collect();
        let result = MolecularWeightFilter::default()
            .apply(molecules, None, &ProgressReporter::new())
            .unwrap();
        assert_eq!(result.n_molecules(), 1);
        assert_eq!(result.n_filtered(), 2);
    }

    #[test]
    fn bounds_are_exclusive() {
        let water = Molecule::from_smiles("O").unwrap();
        let weight = water.molecular_weight();
        let filter = MolecularWeightFilter {
            minimum_weight: weight,
            maximum_weight: weight + 10.0,
        };
        assert!(matches!(filter.process(water), Processed::Filtered(_)));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let filter = MolecularWeightFilter {
            minimum_weight: 500.0,
            maximum_weight: 100.0,
        };
        assert!(matches!(
            filter.validate(),
            Err(WorkflowError::InvalidSettings { .. })
        ));
    }
}
