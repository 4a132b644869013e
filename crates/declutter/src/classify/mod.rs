pub mod rules;

pub use rules::{
    build_sibling_indexes, Classification, ClassificationRule, ClassificationRules, Predicate,
    RuleEngine,
};
