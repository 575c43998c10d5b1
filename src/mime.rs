//! Extension to content type lookup.

/// Content type sent for files whose extension isn't in the table.
pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Extension/content type pairs. Extensions are unique, so first match wins.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpg"),
    ("ico", "image/x-icon"),
    ("css", "text/css"),
    ("js", "application/javascript"),
];

/// Get content type for a URL path, based on the text after its last dot.
pub fn content_type(path: &str) -> &'static str {
    path.rsplit_once('.')
        .and_then(|(_, extension)| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| *known == extension)
        })
        .map(|(_, mimetype)| *mimetype)
        .unwrap_or(UNKNOWN_CONTENT_TYPE)
}
