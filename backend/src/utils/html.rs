// src/utils/html.rs

/// Clean authored HTML (quiz titles, question text, options, explanations).
///
/// Whitelist-based: safe formatting tags such as <b> or <code> survive,
/// <script>/<iframe> and event-handler attributes are removed.
/// Answer keys are never passed through here since that would change what
/// a short answer is compared against.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
