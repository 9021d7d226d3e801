//! Score record types.

use std::fmt;

use serde::{Serialize, Serializer};

/// Points available before bonuses.
pub const MAX_SCORE: u32 = 100;

/// Cap on the excellence bonus.
pub const MAX_BONUS: u32 = 10;

/// Scored categories, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Syntax,
    Documentation,
    Complexity,
    Security,
    ErrorHandling,
    Tests,
    Maintainability,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Syntax,
        Category::Documentation,
        Category::Complexity,
        Category::Security,
        Category::ErrorHandling,
        Category::Tests,
        Category::Maintainability,
    ];

    pub fn max_points(&self) -> u32 {
        match self {
            Self::Syntax => 20,
            Self::Documentation => 15,
            Self::Complexity => 15,
            Self::Security => 20,
            Self::ErrorHandling => 10,
            Self::Tests => 10,
            Self::Maintainability => 10,
        }
    }

    /// Machine key, as used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Documentation => "documentation",
            Self::Complexity => "complexity",
            Self::Security => "security",
            Self::ErrorHandling => "error_handling",
            Self::Tests => "tests",
            Self::Maintainability => "maintainability",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax => "Syntax",
            Self::Documentation => "Documentation",
            Self::Complexity => "Complexity",
            Self::Security => "Security",
            Self::ErrorHandling => "Error Handling",
            Self::Tests => "Tests",
            Self::Maintainability => "Maintainability",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative rating derived from the final (post-bonus) total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    NotReady,
    SignificantWorkNeeded,
    NeedsImprovement,
    NearlyReady,
    ProductionReady,
    Excellent,
    Exceptional,
}

impl Rating {
    pub fn from_total(total: u32) -> Self {
        match total {
            100.. => Self::Exceptional,
            90..=99 => Self::Excellent,
            85..=89 => Self::ProductionReady,
            75..=84 => Self::NearlyReady,
            60..=74 => Self::NeedsImprovement,
            40..=59 => Self::SignificantWorkNeeded,
            _ => Self::NotReady,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Exceptional => "Exceptional - Production Ready",
            Self::Excellent => "Excellent - Production Ready",
            Self::ProductionReady => "Production Ready",
            Self::NearlyReady => "Nearly Ready",
            Self::NeedsImprovement => "Needs Improvement",
            Self::SignificantWorkNeeded => "Significant Work Needed",
            Self::NotReady => "Not Ready for Production",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Points awarded per category plus the excellence bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryPoints {
    pub syntax: u32,
    pub documentation: u32,
    pub complexity: u32,
    pub security: u32,
    pub error_handling: u32,
    pub tests: u32,
    pub maintainability: u32,
    pub excellence_bonus: u32,
}

impl CategoryPoints {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Syntax => self.syntax,
            Category::Documentation => self.documentation,
            Category::Complexity => self.complexity,
            Category::Security => self.security,
            Category::ErrorHandling => self.error_handling,
            Category::Tests => self.tests,
            Category::Maintainability => self.maintainability,
        }
    }

    /// Sum of the categories, bonus excluded.
    pub fn base_total(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Per-category result. Invalid syntax short-circuits everything to `FAIL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    SyntaxFail,
    Scored(CategoryPoints),
}

impl Breakdown {
    /// Points for `category`; 0 for every category when syntax failed.
    pub fn points(&self, category: Category) -> u32 {
        match self {
            Self::SyntaxFail => 0,
            Self::Scored(points) => points.get(category),
        }
    }

    pub fn bonus(&self) -> u32 {
        match self {
            Self::SyntaxFail => 0,
            Self::Scored(points) => points.excellence_bonus,
        }
    }

    pub fn is_syntax_fail(&self) -> bool {
        matches!(self, Self::SyntaxFail)
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::SyntaxFail => serializer.serialize_str("FAIL"),
            Self::Scored(points) => points.serialize(serializer),
        }
    }
}

/// Scoring result for one evaluation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    /// Category points plus bonus, 0..=110.
    pub total: u32,
    pub max: u32,
    /// `total / max * 100`, one decimal.
    pub percentage: f64,
    pub rating: Rating,
    pub breakdown: Breakdown,
    pub bonus_reasons: Vec<String>,
}

impl ScoreRecord {
    pub fn syntax_failure() -> Self {
        Self {
            total: 0,
            max: MAX_SCORE,
            percentage: 0.0,
            rating: Rating::NotReady,
            breakdown: Breakdown::SyntaxFail,
            bonus_reasons: Vec::new(),
        }
    }
}
