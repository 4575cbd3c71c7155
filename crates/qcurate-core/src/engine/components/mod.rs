//! The built-in workflow components and their serializable form.

mod conformers;
mod dedup;
mod element;
mod rotor;
mod weight;

pub use conformers::StandardConformerGenerator;
pub use dedup::Deduplication;
pub use element::{ElementFilter, ElementSpec};
pub use rotor::RotorFilter;
pub use weight::MolecularWeightFilter;

use super::component::WorkflowComponent;
use serde::{Deserialize, Serialize};

/// A configured component, tagged by its `type` name when serialized.
///
/// This is the form in which components are stored in a workflow, exported
/// to settings files and recorded in a dataset's filter history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    Deduplication(Deduplication),
    ElementFilter(ElementFilter),
    MolecularWeightFilter(MolecularWeightFilter),
    RotorFilter(RotorFilter),
    StandardConformerGenerator(StandardConformerGenerator),
}

impl Component {
    pub fn as_component(&self) -> &dyn WorkflowComponent {
        match self {
            Component::Deduplication(c) => c,
            Component::ElementFilter(c) => c,
            Component::MolecularWeightFilter(c) => c,
            Component::RotorFilter(c) => c,
            Component::StandardConformerGenerator(c) => c,
        }
    }

    pub fn name(&self) -> &'static str {
        self.as_component().name()
    }

    /// The component settings as a JSON object, including the `type` tag.
    pub fn settings(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Every built-in component with its default settings.
    pub fn defaults() -> Vec<Component> {
        vec![
            Component::Deduplication(Deduplication::default()),
            Component::ElementFilter(ElementFilter::default()),
            Component::MolecularWeightFilter(MolecularWeightFilter::default()),
            Component::RotorFilter(RotorFilter::default()),
            Component::StandardConformerGenerator(StandardConformerGenerator::default()),
        ]
    }

    /// A component with default settings, looked up by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Component> {
        Self::defaults()
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

macro_rules! impl_from_component {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Component {
                fn from(component: $variant) -> Self {
                    Component::$variant(component)
                }
            }
        )*
    };
}

impl_from_component!(
    Deduplication,
    ElementFilter,
    MolecularWeightFilter,
    RotorFilter,
    StandardConformerGenerator,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_carry_the_type_tag() {
        let settings = Component::from(RotorFilter::default()).settings();
        assert_eq!(settings["type"], "RotorFilter");
        assert_eq!(settings["maximum_rotors"], 4);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let component: Component =
            serde_json::from_str(r#"{"type": "MolecularWeightFilter", "maximum_weight": 500}"#)
                .unwrap();
        assert_eq!(
            component,
            Component::MolecularWeightFilter(MolecularWeightFilter {
                minimum_weight: 130.0,
                maximum_weight: 500.0,
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<Component>(r#"{"type": "Nope"}"#).is_err());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(
            Component::from_name("deduplication").map(|c| c.name()),
            Some("Deduplication")
        );
        assert!(Component::from_name("Unknown").is_none());
        assert_eq!(Component::defaults().len(), 5);
    }
}
