use super::error::WorkflowError;
use super::progress::{Progress, ProgressReporter};
use super::result::ComponentResult;
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, info_span};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Execution traits of a component that the pipeline relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentProperties {
    /// Molecules can be processed independently on worker threads.
    pub process_parallel: bool,
    /// The component can emit several molecules with the same identity, so
    /// its output must be checked for uniqueness.
    pub produces_duplicates: bool,
}

/// Static description of a component, as listed to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub description: String,
    pub fail_reason: String,
    pub properties: ComponentProperties,
}

/// Outcome of running one molecule through a component.
#[derive(Debug, Clone)]
pub enum Processed {
    /// The molecule (or the molecules derived from it) passed.
    Passed(Vec<Molecule>),
    /// The molecule was rejected.
    Filtered(Molecule),
}

impl Processed {
    pub fn pass(molecule: Molecule) -> Self {
        Processed::Passed(vec![molecule])
    }
}

/// One filter or transform stage of a curation workflow.
///
/// Implementors describe a single molecule step in [`process`](Self::process);
/// the provided [`apply`](Self::apply) runs it over a collection, in parallel
/// when allowed, and gathers the results. Components hold only their settings
/// and never keep state between calls.
pub trait WorkflowComponent: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Reason recorded for molecules this component removes.
    fn fail_reason(&self) -> &'static str;

    fn properties(&self) -> ComponentProperties;

    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            fail_reason: self.fail_reason().to_string(),
            properties: self.properties(),
        }
    }

    /// Checks that everything the component needs at run time is present.
    fn is_available(&self) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Checks the component settings for consistency.
    fn validate(&self) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Software versions that produced the component's results.
    fn provenance(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            "qcurate".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )])
    }

    fn process(&self, molecule: Molecule) -> Processed;

    /// Runs the component over a collection of molecules.
    ///
    /// `processors` limits the worker threads; `Some(1)` forces serial
    /// execution and `None` uses every available core. Retained molecules keep
    /// the relative order of the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the component is unavailable, its settings are
    /// invalid, or the worker pool cannot be created.
    fn apply(
        &self,
        molecules: Vec<Molecule>,
        processors: Option<usize>,
        reporter: &ProgressReporter,
    ) -> Result<ComponentResult, WorkflowError> {
        let _span = info_span!(
            "component",
            name = self.name(),
            n_molecules = molecules.len()
        )
        .entered();
        self.is_available()?;
        self.validate()?;

        let skip_unique_check = !self.properties().produces_duplicates;
        let mut result = ComponentResult::new(self.name(), skip_unique_check);
        reporter.report(Progress::TaskStart {
            total_steps: molecules.len() as u64,
        });
        let outcomes = process_all(self, molecules, processors, reporter)?;
        reporter.report(Progress::TaskFinish);

        for outcome in outcomes {
            match outcome {
                Processed::Passed(passed) => {
                    for molecule in passed {
                        result.add_molecule(molecule);
                    }
                }
                Processed::Filtered(molecule) => {
                    debug!(
                        name = %molecule.name,
                        reason = self.fail_reason(),
                        "Molecule filtered"
                    );
                    result.filter_molecule(molecule);
                }
            }
        }
        report_removed(self, result.n_filtered(), reporter);

        info!(
            passed = result.n_molecules(),
            filtered = result.n_filtered(),
            "Component finished."
        );
        Ok(result)
    }
}

/// Tells the user how many molecules a component removed and why.
pub(crate) fn report_removed<C: WorkflowComponent + ?Sized>(
    component: &C,
    removed: usize,
    reporter: &ProgressReporter,
) {
    if removed > 0 {
        reporter.report(Progress::Message(format!(
            "{}: {removed} molecule(s) removed. {}",
            component.name(),
            component.fail_reason()
        )));
    }
}

/// Processes every molecule, keeping the input order of the outcomes.
pub(crate) fn process_all<C: WorkflowComponent + ?Sized>(
    component: &C,
    molecules: Vec<Molecule>,
    processors: Option<usize>,
    reporter: &ProgressReporter,
) -> Result<Vec<Processed>, WorkflowError> {
    let step = |molecule: Molecule| {
        let outcome = component.process(molecule);
        reporter.report(Progress::TaskIncrement);
        outcome
    };

    #[cfg(feature = "parallel")]
    if component.properties().process_parallel && processors != Some(1) && molecules.len() > 1 {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = processors {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| WorkflowError::ThreadPool(e.to_string()))?;
        return Ok(pool.install(|| molecules.into_par_iter().map(step).collect()));
    }

    #[cfg(not(feature = "parallel"))]
    let _ = processors;

    Ok(molecules.into_iter().map(step).collect())
}
