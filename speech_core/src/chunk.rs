/// Group paragraphs into chunks under `max_chars`, never splitting
/// mid-paragraph. Chunk seams are a known audible-artifact risk, so
/// boundaries fall only between paragraphs.
pub fn chunk_by_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks: Vec<String> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut len = 0usize;

    for p in paragraphs {
        // An oversized single paragraph becomes its own chunk.
        if p.len() > max_chars {
            if !buf.is_empty() {
                chunks.push(buf.join("\n\n"));
                buf.clear();
                len = 0;
            }
            chunks.push(p.to_string());
            continue;
        }

        // The "\n\n" joiner between buffered paragraphs counts too.
        let sep = if buf.is_empty() { 0 } else { 2 };
        if len + sep + p.len() > max_chars && !buf.is_empty() {
            chunks.push(buf.join("\n\n"));
            buf = vec![p];
            len = p.len();
        } else {
            buf.push(p);
            len += sep + p.len();
        }
    }

    if !buf.is_empty() {
        chunks.push(buf.join("\n\n"));
    }
    chunks
}
