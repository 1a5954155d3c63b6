// User-friendly error messages
//
// Turns startup failures into messages that tell the operator what to fix.

use anyhow::{Context, Result};

/// Wrap an error with user-friendly context
pub trait UserFriendlyError {
    /// Add user-friendly context with a suggestion
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self;
}

impl<T> UserFriendlyError for Result<T> {
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self {
        self.with_context(|| format!("{}\n\n\x1b[1;33mSuggestion:\x1b[0m {}", problem, suggestion))
    }
}

/// Format a missing API key error
pub fn api_key_missing_error(provider: &str, env_var: &str) -> String {
    format!(
        "{provider} API key is missing\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Set the environment variable:\n\
           \x1b[36mexport {env_var}=\"...\"\x1b[0m\n\n\
        2. Or add it to your config file:\n\
           \x1b[36m~/.seva/config.toml\x1b[0m\n\
           [model]\n\
           api_key = \"...\"",
    )
}

/// Format a missing grievance backend URL error
pub fn grm_url_missing_error() -> String {
    "Grievance backend URL is not configured\n\n\
    \x1b[1;32mTry:\x1b[0m\n\
    1. Set the environment variable:\n\
       \x1b[36mexport GRM_API_URL=\"https://...\"\x1b[0m\n\n\
    2. Or add it to your config file:\n\
       [grm]\n\
       api_url = \"https://...\"\n\
       api_token = \"...\"\n\
       user_id = \"...\""
        .to_string()
}

/// Format a config parse error with helpful suggestions
pub fn config_parse_error(path: &str, error: &str) -> String {
    format!(
        "Failed to parse config file {path}\n\n\
        \x1b[1;33mError:\x1b[0m {error}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check config file syntax:\n\
           \x1b[36mcat {path}\x1b[0m\n\n\
        2. Common mistakes:\n\
           • Missing quotes around strings\n\
           • Unclosed section brackets []\n\
           • executor_failure must be \"isolate\" or \"fail_fast\"",
    )
}

/// Format a file not found error
pub fn file_not_found_error(path: &str, description: &str) -> String {
    format!(
        "{description} not found: {path}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check the path passed with --config\n\
        2. Omit --config to use ~/.seva/config.toml",
    )
}
