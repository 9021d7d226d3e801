use crate::analysis::python::ParsedModule;
use crate::analysis::types::{StructureFacts, GOD_CLASS_METHOD_LIMIT, LONG_METHOD_LINE_LIMIT};

/// Single-responsibility heuristics over every class in the module.
pub fn extract_structure(module: &ParsedModule<'_>) -> StructureFacts {
    let classes = module.classes();
    if classes.is_empty() {
        return StructureFacts {
            srp_score: 100.0,
            ..StructureFacts::default()
        };
    }

    let mut facts = StructureFacts::default();
    let mut total_methods = 0usize;

    for class in &classes {
        let class_name = module.name(*class);
        let methods = module.direct_methods(*class);
        total_methods += methods.len();

        if methods.len() > GOD_CLASS_METHOD_LIMIT {
            facts.god_classes.insert(class_name.to_string());
        }

        for method in methods {
            let span = method.end_position().row - method.start_position().row;
            if span > LONG_METHOD_LINE_LIMIT {
                facts
                    .long_methods
                    .insert(format!("{}.{}", class_name, module.name(method)));
            }
        }
    }

    facts.class_count = classes.len();
    facts.avg_methods_per_class = total_methods as f64 / classes.len() as f64;
    facts.srp_score = (100.0 - facts.avg_methods_per_class * 5.0).max(0.0);
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::python::parse;

    fn class_with_methods(name: &str, count: usize) -> String {
        let mut source = format!("class {}:\n", name);
        for i in 0..count {
            source.push_str(&format!("    def m{}(self):\n        return {}\n\n", i, i));
        }
        source
    }

    #[test]
    fn test_no_classes_is_perfect_srp() {
        let module = parse("def f():\n    return 1\n").unwrap();
        let facts = extract_structure(&module);
        assert_eq!(facts.class_count, 0);
        assert_eq!(facts.srp_score, 100.0);
    }

    #[test]
    fn test_god_class_detection() {
        let source = format!(
            "{}\n{}",
            class_with_methods("Huge", 11),
            class_with_methods("Small", 1)
        );
        let module = parse(&source).unwrap();
        let facts = extract_structure(&module);

        assert_eq!(facts.class_count, 2);
        assert_eq!(facts.avg_methods_per_class, 6.0);
        assert_eq!(facts.srp_score, 70.0);
        assert!(facts.god_classes.contains("Huge"));
        assert!(!facts.god_classes.contains("Small"));
    }

    #[test]
    fn test_exactly_ten_methods_is_not_god_class() {
        let source = class_with_methods("Edge", 10);
        let module = parse(&source).unwrap();
        assert!(extract_structure(&module).god_classes.is_empty());
    }

    #[test]
    fn test_long_method_detection() {
        let mut source = String::from("class Report:\n    def build(self):\n");
        for i in 0..55 {
            source.push_str(&format!("        line_{} = {}\n", i, i));
        }
        source.push_str("        return None\n\n    def short(self):\n        return 1\n");

        let module = parse(&source).unwrap();
        let facts = extract_structure(&module);
        assert_eq!(
            facts.long_methods.iter().collect::<Vec<_>>(),
            vec!["Report.build"]
        );
    }

    #[test]
    fn test_srp_score_floors_at_zero() {
        let source = class_with_methods("Monolith", 25);
        let module = parse(&source).unwrap();
        assert_eq!(extract_structure(&module).srp_score, 0.0);
    }
}
