use crate::cli::ComponentsArgs;
use crate::error::Result;
use qcurate::engine::components::Component;
use std::fmt::Write;

pub fn run(args: ComponentsArgs) -> Result<()> {
    print!("{}", listing(args.settings));
    Ok(())
}

pub fn listing(with_settings: bool) -> String {
    let mut out = String::new();
    for component in Component::defaults() {
        let info = component.as_component().info();
        let parallel = if info.properties.process_parallel {
            "parallel"
        } else {
            "serial"
        };
        let _ = writeln!(out, "{} ({parallel})", info.name);
        let _ = writeln!(out, "    {}", info.description);
        if with_settings {
            let settings = format!("{:#}", component.settings());
            for line in settings.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_component() {
        let text = listing(false);
        for name in [
            "Deduplication (serial)",
            "ElementFilter (parallel)",
            "MolecularWeightFilter",
            "RotorFilter",
            "StandardConformerGenerator",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(!text.contains("\"type\""));
    }

    #[test]
    fn settings_are_printed_as_json() {
        let text = listing(true);
        assert!(text.contains("\"type\": \"RotorFilter\""));
        assert!(text.contains("\"maximum_rotors\": 4"));
    }
}
