use crate::strategy::SelectionStrategy;

/// Pick the variant for a request: the use-case-specific entry when one
/// exists, otherwise the primary model.
pub fn select_model<'a>(strategy: &'a SelectionStrategy, use_case: &str) -> &'a str {
    strategy
        .use_case_models
        .get(use_case)
        .map(String::as_str)
        .unwrap_or(&strategy.primary_model)
}
