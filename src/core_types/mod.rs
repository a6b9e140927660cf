//! Core data model: requirements in, test cases out.

pub mod requirements;
pub mod spec;
pub mod test_case;

pub use requirements::{
    AcceptanceCriterion, Clause, CriterionKind, FormatHint, ParseDegraded, ParseSource,
    RequirementModel, SystemContext, TicketContent, UserStory,
};
pub use spec::{OutputFormat, Priority, TestLevel, TestSpecification, TestType};
pub use test_case::{
    GenerationResult, IdSequence, SkippedVariant, StepRole, TestCase, TestStep, NOT_SPECIFIED,
};
