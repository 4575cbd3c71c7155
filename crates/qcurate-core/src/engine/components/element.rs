use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::engine::component::{ComponentProperties, Processed, WorkflowComponent};
use crate::engine::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An element given either by symbol or by atomic number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementSpec {
    Number(u8),
    Symbol(String),
}

impl ElementSpec {
    pub fn resolve(&self) -> Option<Element> {
        match self {
            ElementSpec::Number(z) => Element::from_atomic_number(*z),
            ElementSpec::Symbol(symbol) => symbol.trim().parse().ok(),
        }
    }
}

impl From<Element> for ElementSpec {
    fn from(element: Element) -> Self {
        ElementSpec::Symbol(element.symbol().to_string())
    }
}

impl fmt::Display for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementSpec::Number(z) => write!(f, "{z}"),
            ElementSpec::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// Removes molecules that contain any element outside the allowed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementFilter {
    pub allowed_elements: Vec<ElementSpec>,
}

impl Default for ElementFilter {
    fn default() -> Self {
        use Element::*;
        Self {
            allowed_elements: [H, C, N, O, F, P, S, Cl, Br, I]
                .into_iter()
                .map(ElementSpec::from)
                .collect(),
        }
    }
}

impl ElementFilter {
    fn allowed(&self) -> BTreeSet<Element> {
        self.allowed_elements
            .iter()
            .filter_map(ElementSpec::resolve)
            .collect()
    }
}

impl WorkflowComponent for ElementFilter {
    fn name(&self) -> &'static str {
        "ElementFilter"
    }

    fn description(&self) -> &'static str {
        "Filter out molecules that contain elements outside the allowed set."
    }

    fn fail_reason(&self) -> &'static str {
        "The molecule contained an element outside the allowed set."
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            process_parallel: true,
            produces_duplicates: false,
        }
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        if let Some(bad) = self.allowed_elements.iter().find(|e| e.resolve().is_none()) {
            return Err(WorkflowError::invalid_settings(
                self.name(),
                format!("'{bad}' is not a valid element symbol or atomic number"),
            ));
        }
        Ok(())
    }

    fn process(&self, molecule: Molecule) -> Processed {
        let allowed = self.allowed();
        if molecule.elements().is_subset(&allowed) {
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

    fn mols(smiles: &[&str]) -> Vec<Molecule> {
        smiles.iter().map(|s| Molecule::from_smiles(s).unwrap()).collect()
    }

    #[test]
    fn default_allows_common_organic_elements() {
        let molecules = mols(&["CCO", "C[Si](C)(C)C", "ClCCBr", "[Na+].[Cl-]"]);
        let result = ElementFilter::default()
            .apply(molecules, None, &ProgressReporter::new())
            .unwrap();
        assert_eq!(result.n_molecules(), 2);
        assert_eq!(result.n_filtered(), 2);
        assert_eq!(result.molecules()[0].canonical_smiles(), "CCO");
    }

    #[test]
    fn accepts_symbols_and_atomic_numbers() {
        let filter = ElementFilter {
            allowed_elements: vec![
                ElementSpec::Number(1),
                ElementSpec::Number(6),
                ElementSpec::Symbol("O".into()),
            ],
        };
        let result = filter
            .apply(mols(&["CCO", "CN"]), Some(1), &ProgressReporter::new())
            .unwrap();
        assert_eq!(result.n_molecules(), 1);
        assert_eq!(result.n_filtered(), 1);
    }

    #[test]
    fn invalid_element_is_rejected_before_processing() {
        let filter = ElementFilter {
            allowed_elements: vec![ElementSpec::Symbol("Xx".into())],
        };
        assert!(matches!(
            filter.apply(mols(&["C"]), None, &ProgressReporter::new()),
            Err(WorkflowError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn deserializes_mixed_element_lists() {
        let filter: ElementFilter =
            serde_json::from_str(r#"{"allowed_elements": ["C", 1, "o"]}"#).unwrap();
        assert_eq!(filter.allowed().len(), 3);
    }
}
