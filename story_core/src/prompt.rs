use crate::request::SanitizedRequest;

/// Build the single structured prompt for one story. The model is
/// asked for strict JSON `{title, paragraphs[]}` with the length tier
/// encoded as a hard requirement.
pub fn story_prompt(request: &SanitizedRequest) -> String {
    let cfg = request.story_length.contract();
    let themes = if request.tags.is_empty() {
        "cozy comfort".to_string()
    } else {
        request.tags.join(", ")
    };

    format!(
        r#"You are a bedtime narrator writing for spoken audio.

Write a soothing bedtime story designed to help someone fall asleep.
It must feel intimate, calm, and human. Never exciting.

STORY DETAILS
- Characters: {p1} and {p2}
- Mood: {mood}
- Themes: {themes}
- Length: {description}

LENGTH REQUIREMENT (hard)
- Target {min_words}-{max_words} words total.
- Use {min_paras}-{max_paras} paragraphs.
- Each paragraph is 1-2 short sentences.

SLEEP STRUCTURE (required)
1) Soft beginning: establish safety and comfort.
2) Slow middle: gentle, low-stakes moments with calming sensory detail.
3) Fading ending: reduce activity and energy, slowly drifting into stillness.

ENDING RULE (required)
In the last 3-5 paragraphs, everything slows down.
Use quieter language and shorter sentences.
Include a gentle cue for sleep without commanding.

QUALITY RULE (required)
Across the story, include gentle sensory detail:
warmth, soft light, gentle sounds, cozy textures, slow breathing.
Do not overdo it. Spread it out naturally.

NARRATION RULES (must follow)
- Most sentences 8-12 words, occasionally up to 16 for natural flow.
- Avoid commas when possible.
- One idea per sentence.
- If a sentence feels long, split it into two.
- Never use nested clauses or complex structures.
- Use simple subject-verb-object structure.

STYLE RULES (required)
- Short, simple, declarative sentences.
- Warm, simple words.
- No suspense, conflict, danger, loud humor, or plot twists.
- Avoid lists and dramatic metaphors.
- Include 1-2 calming anchor phrases naturally in the story, such as
  "It's okay.", "You're safe here.", "There's no rush.", "Just rest."

OUTPUT (strict)
Return ONLY valid JSON (no extra text) in this shape:
{{
  "title": "string",
  "paragraphs": ["string", "string", ...]
}}

Rules:
- paragraphs array length must be {min_paras}-{max_paras}.
- No newline characters inside any paragraph string.
- JSON only. No extra text.
"#,
        p1 = request.protagonist1,
        p2 = request.protagonist2,
        mood = request.mood,
        themes = themes,
        description = cfg.description,
        min_words = cfg.min_words,
        max_words = cfg.max_words,
        min_paras = cfg.min_paragraphs,
        max_paras = cfg.max_paragraphs,
    )
}

/// Continuation request used by the length-correction loop: same
/// voice, a fixed number of additional paragraphs, JSON only.
pub fn continuation_prompt(add_count: usize) -> String {
    format!(
        r#"Continue the SAME bedtime story with MORE paragraphs.
Rules:
- Keep the same style and characters.
- Add exactly {add_count} new paragraphs.
- Return ONLY valid JSON in this shape:
{{ "paragraphs": ["string", "string", ...] }}
- Do not include title.
- JSON only, no extra text."#
    )
}
