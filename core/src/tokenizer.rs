/// Tokenize text for the classifier: lowercase, then split on whitespace.
///
/// Runs of whitespace never produce empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}
