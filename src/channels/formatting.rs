/// Split plain text into chunks no longer than `max_len` bytes.
///
/// Long item listings break between lines where possible; a single line that
/// is too long is cut at the nearest char boundary.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut boundary = max_len;
        while boundary > 0 && !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }

        let newline = remaining[..boundary].rfind('\n').filter(|&p| p > 0);
        let split_at = match newline {
            Some(p) => p,
            // max_len smaller than the first char: take that char anyway.
            None if boundary == 0 => remaining
                .char_indices()
                .nth(1)
                .map_or(remaining.len(), |(i, _)| i),
            None => boundary,
        };

        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk.to_string());
        // Only the newline we split on is dropped.
        remaining = match newline {
            Some(_) => &rest[1..],
            None => rest,
        };
    }

    chunks
}
