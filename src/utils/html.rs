/// Clean text that came from outside the application (the question generator)
/// using the ammonia library.
///
/// Safe inline tags survive; `<script>` and friends are removed together with their
/// content, and event-handler attributes are stripped. Surrounding whitespace is trimmed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
