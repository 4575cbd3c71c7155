use crate::cli::InspectArgs;
use crate::error::Result;
use qcurate::workflows::dataset::Dataset;
use std::fmt::Write;

pub fn run(args: InspectArgs) -> Result<()> {
    let dataset = Dataset::parse_file(&args.dataset)?;
    print!("{}", summary(&dataset, args.filtered));
    Ok(())
}

/// A human-readable overview of a dataset.
pub fn summary(dataset: &Dataset, list_filtered: bool) -> String {
    let mut out = String::new();
    let meta = &dataset.metadata;
    let _ = writeln!(out, "Dataset:        {}", dataset.dataset_name);
    if !dataset.dataset_tagline.is_empty() {
        let _ = writeln!(out, "Tagline:        {}", dataset.dataset_tagline);
    }
    let _ = writeln!(out, "Type:           {}", meta.collection_type);
    let _ = writeln!(out, "Created:        {} by {}", meta.creation_date, meta.submitter);
    let _ = writeln!(out, "Molecules:      {}", dataset.n_molecules());
    let _ = writeln!(out, "Records:        {}", dataset.n_records());
    let elements: Vec<&str> = meta.elements.iter().map(String::as_str).collect();
    let _ = writeln!(out, "Elements:       {}", elements.join(" "));

    let _ = writeln!(out, "QC specifications ({}):", dataset.n_qc_specs());
    for spec in dataset.qc_specifications.values() {
        let _ = writeln!(out, "  {spec}");
    }

    let _ = writeln!(
        out,
        "Workflow ({} stage(s), {} molecule(s) filtered):",
        dataset.n_components(),
        dataset.n_filtered()
    );
    for record in &dataset.filtered_molecules {
        let _ = writeln!(out, "  {:<28} {:>6} removed", record.component, record.molecules.len());
        if list_filtered {
            for smiles in &record.molecules {
                let _ = writeln!(out, "    {smiles}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcurate::core::models::molecule::Molecule;
    use qcurate::engine::components::ElementFilter;
    use qcurate::engine::progress::ProgressReporter;
    use qcurate::workflows::factory::DatasetFactory;

    fn dataset() -> Dataset {
        let mut factory = DatasetFactory::new();
        factory.add_workflow_component(ElementFilter::default()).unwrap();
        let molecules = ["CCO", "C[Si](C)(C)C"]
            .iter()
            .map(|s| Molecule::from_smiles(s).unwrap())
            .collect();
        factory
            .create_dataset("inspected", molecules, "d", "t", None, &ProgressReporter::new())
            .unwrap()
    }

    #[test]
    fn summary_lists_counts_and_stages() {
        let text = summary(&dataset(), false);
        assert!(text.contains("Dataset:        inspected"));
        assert!(text.contains("Molecules:      1"));
        assert!(text.contains("Elements:       C H O"));
        assert!(text.contains("default: psi4/B3LYP-D3BJ/DZVP"));
        assert!(text.contains("ElementFilter"));
        assert!(!text.contains("C[Si](C)(C)C"));
    }

    #[test]
    fn filtered_molecules_are_listed_on_request() {
        let text = summary(&dataset(), true);
        assert!(text.contains("    C[Si](C)(C)C"));
    }
}
