//! Heuristic inference over tables: profiling and classification.

mod profiler;
mod roles;
mod source;

pub use profiler::{DATE_NAME_HINTS, Profiler, profile};
pub use roles::{ROLE_RULES, RoleClassifier, RolePredicate, RoleRule, classify_columns};
pub use source::{
    FILE_TYPE_RULES, FileTypeRule, SERVICE_KEYWORDS, SourceClassifier, classify_source,
    infer_file_type, infer_service,
};
