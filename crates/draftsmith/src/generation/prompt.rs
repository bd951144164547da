use crate::model::FormatStyle;

use super::ContentRequest;

fn style_instruction(style: FormatStyle) -> &'static str {
    match style {
        FormatStyle::Bullets => {
            "Use bullet points only. Keep every point short and self-contained."
        }
        FormatStyle::BulletsAndParagraph => {
            "Open with a short paragraph, list the key details as bullet points, \
             and close with a summarizing paragraph."
        }
        FormatStyle::Paragraph => {
            "Use paragraphs only, written as continuous prose without lists."
        }
    }
}

/// Builds the provider prompt for one section of one topic.
pub fn build_prompt(request: &ContentRequest) -> String {
    let mut prompt = format!(
        "You write original academic content for college assignments.\n\
         \n\
         Topic: {topic}\n\
         Section: {section}\n\
         Length: about {words} words (within 10 words either way)\n\
         Format: {style}\n\
         \n\
         Guidelines:\n\
         - Keep a formal academic tone and stay on the topic \"{topic}\".\n\
         - Support claims with explanation, examples or analysis where they help.\n\
         - Write only the body of the {section} section; do not add headings or titles.\n",
        topic = request.topic,
        section = request.section,
        words = request.word_count,
        style = style_instruction(request.style),
    );

    if request.section.eq_ignore_ascii_case("REFERENCES") {
        prompt.push_str("- Format every reference in APA style.\n");
    }

    prompt.push_str(&format!("\nWrite the {} section now.", request.section));
    prompt
}
