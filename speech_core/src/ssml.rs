/// Paragraph-only SSML shaping. Pauses are inserted at paragraph
/// boundaries only: sentence-level break injection produces an
/// unnaturally robotic cadence.
const PARAGRAPH_BREAK: &str = r#"<break time="600ms"/>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Wrap plain text (paragraphs separated by blank lines) in `<speak>`
/// markup with a fixed inter-paragraph break.
pub fn text_to_ssml(text: &str) -> String {
    let joined = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape(p)))
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK);
    format!("<speak>{joined}</speak>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_get_breaks_between_them() {
        let ssml = text_to_ssml("First line.\n\nSecond line.");
        assert_eq!(
            ssml,
            "<speak><p>First line.</p><break time=\"600ms\"/><p>Second line.</p></speak>"
        );
    }

    #[test]
    fn single_paragraph_has_no_break() {
        let ssml = text_to_ssml("Only one.");
        assert!(!ssml.contains("<break"));
    }

    #[test]
    fn markup_characters_are_escaped() {
        let ssml = text_to_ssml("cookies & <milk>");
        assert!(ssml.contains("cookies &amp; &lt;milk&gt;"));
    }
}
