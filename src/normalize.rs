/// Strip access-log delimiters from a raw line so it splits cleanly on single spaces.
///
/// Removes `[`, `]`, `"` and `- ` sequences, then collapses leading, trailing and
/// repeated spaces. Normalizing an already normalized line returns it unchanged.
pub fn normalize_line(line: &str) -> String {
    let mut stripped = line.replace(['[', ']', '"'], "");
    // "-- " reduces to "- " after one pass
    while stripped.contains("- ") {
        stripped = stripped.replace("- ", "");
    }

    stripped
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a line and split it into its positional fields.
pub fn split_fields(line: &str) -> Vec<String> {
    normalize_line(line)
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
