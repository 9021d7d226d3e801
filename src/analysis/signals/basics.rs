use crate::analysis::python::ParsedModule;

/// Function inventory facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicFacts {
    pub function_count: usize,
    pub has_docstrings: bool,
}

/// Count every function (methods and nested ones included) and check whether
/// any of them carries a docstring.
pub fn extract_basics(module: &ParsedModule<'_>) -> BasicFacts {
    let functions = module.functions();
    let has_docstrings = functions
        .iter()
        .any(|f| module.docstring(*f).is_some());

    BasicFacts {
        function_count: functions.len(),
        has_docstrings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::python::parse;
    use indoc::indoc;

    #[test]
    fn test_counts_methods_and_nested_functions() {
        let source = indoc! {r#"
            def outer():
                def inner():
                    return 1
                return inner()

            class Greeter:
                def greet(self):
                    """Say hello."""
                    return "hi"
        "#};
        let module = parse(source).unwrap();
        assert_eq!(
            extract_basics(&module),
            BasicFacts {
                function_count: 3,
                has_docstrings: true,
            }
        );
    }

    #[test]
    fn test_module_docstring_does_not_count() {
        let source = "\"\"\"Module.\"\"\"\n\ndef f():\n    return 1\n";
        let module = parse(source).unwrap();
        assert!(!extract_basics(&module).has_docstrings);
    }

    #[test]
    fn test_empty_module() {
        let module = parse("").unwrap();
        assert_eq!(extract_basics(&module), BasicFacts::default());
    }
}
