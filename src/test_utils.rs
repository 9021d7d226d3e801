//! Shared test utilities for building evaluation records.

use crate::analysis::{
    ErrorHandlingFacts, EvaluationRecord, MaintainabilityFacts, MaintainabilityRating,
    StructureFacts, TestFacts,
};

/// Valid code with nothing else going for it: no docstrings, no functions
/// measured, clean scan, no error handling, no tests, maintainability 0.
pub fn baseline_record() -> EvaluationRecord {
    EvaluationRecord {
        syntax_ok: true,
        structure: StructureFacts {
            srp_score: 100.0,
            ..StructureFacts::default()
        },
        ..EvaluationRecord::default()
    }
}

/// Baseline plus docstrings, full error handling and maintainability 85.
pub fn polished_record() -> EvaluationRecord {
    EvaluationRecord {
        has_docstrings: true,
        error_handling: ErrorHandlingFacts {
            has_try_except: true,
            has_custom_exceptions: true,
            has_logging: true,
            exception_block_count: 1,
            bare_except_count: 0,
            has_validation: true,
        },
        maintainability: maintainability(85.0),
        ..baseline_record()
    }
}

/// A record that meets every scored criterion.
pub fn exemplary_record() -> EvaluationRecord {
    EvaluationRecord {
        function_count: 8,
        avg_complexity: 2.0,
        tests: TestFacts {
            has_tests: true,
            test_function_count: 6,
            assertion_count: 20,
            frameworks: ["pytest".to_string()].into_iter().collect(),
        },
        maintainability: maintainability(95.0),
        ..polished_record()
    }
}

pub fn maintainability(index: f64) -> MaintainabilityFacts {
    MaintainabilityFacts {
        index,
        rating: MaintainabilityRating::from_index(index),
        ..MaintainabilityFacts::default()
    }
}
