//! Prompt templates for every workflow.
//!
//! All wording sent to a model lives here so a prompt change touches one
//! file and tests can pin the exact text. Templates with placeholders are
//! exposed as functions; fixed prompts as constants.

/// Substituted for the text blob when no page produced any text.
pub const NO_TEXT_PLACEHOLDER: &str = "No text";

/// Substituted for the OCR blob when nothing was recognised.
pub const NO_OCR_PLACEHOLDER: &str = "No OCR";

/// Transcription instruction sent with each extracted image.
pub const OCR_PROMPT: &str = "Transcribe all text visible in this image exactly as written. \
Output only the transcribed text, with no commentary. \
If the image contains no text, output nothing.";

/// Fixed three-question analysis of a document.
pub fn document_analysis_prompt(text: &str, ocr: &str) -> String {
    format!(
        "Analyze this document:\nText: {text}\nOCR: {ocr}\nAnswer:\n1. Main topic?\n2. Charts/tables?\n3. Key info?"
    )
}

/// Follow-up question over an analyzed document.
pub fn document_question_prompt(context: &str, question: &str) -> String {
    format!("Document content: {context}\nQuestion: {question}\nAnswer concisely:")
}

// ── Summarizer ───────────────────────────────────────────────────────────

pub const NO_TEXT_TO_SUMMARIZE: &str = "No text to summarize";
pub const NO_TEXT_EXTRACTED: &str = "No text extracted";

pub fn summarize_prompt(text: &str) -> String {
    format!("Summarize this text concisely:\n\n{text}\n\nSummary:")
}

// ── Blog ─────────────────────────────────────────────────────────────────

pub const NO_INFO_FOUND: &str = "No info found.";

pub fn blog_write_prompt(topic: &str, research: &str) -> String {
    format!("Write a short, engaging blog post on '{topic}' using this info:\n{research}")
}

pub fn blog_refine_prompt(feedback: &str, blog: &str) -> String {
    format!("Refine this blog based on feedback '{feedback}':\n{blog}")
}

// ── Image recognition ────────────────────────────────────────────────────

pub const ANIMAL_IMAGE_PROMPT: &str = "Describe this small JPG image of an animal.";

// ── Campaign ─────────────────────────────────────────────────────────────

pub const NO_RESEARCH_FOUND: &str = "No research found.";

pub fn campaign_ideas_prompt(topic: &str) -> String {
    format!("Brainstorm 3 creative marketing campaign ideas for {topic}.")
}

pub fn campaign_research_query(topic: &str) -> String {
    format!("{topic} target audience trends 2025")
}

pub fn campaign_draft_prompt(topic: &str, ideas: &str, research: &str) -> String {
    format!(
        "Write a draft marketing blog post for {topic} using these ideas:\n{ideas}\nand this research:\n{research}"
    )
}

pub fn campaign_synthesize_prompt(draft: &str) -> String {
    format!("Refine this draft into a polished 300-word marketing blog post:\n{draft}")
}

// ── Analysts ─────────────────────────────────────────────────────────────

/// User turn that follows the analyst instructions.
pub const ANALYST_REQUEST: &str = "Generate the set of analysts.";

/// System message for persona generation.
///
/// The trailing format block asks for the JSON shape parsed by
/// [`crate::workflows::analysts`].
pub fn analyst_instructions(topic: &str, feedback: &str, max_analysts: u8) -> String {
    format!(
        "You are tasked with creating a set of AI analyst personas. Follow these instructions carefully:

1. First, review the research topic:
{topic}

2. Examine any editorial feedback that has been optionally provided to guide creation of the analysts: 
{feedback}

3. Determine the most interesting themes based upon documents and / or feedback above.

4. Pick the top {max_analysts} themes.

5. Assign one analyst to each theme.

Respond with JSON only, no prose and no code fences, in exactly this shape:
{{\"analysts\": [{{\"affiliation\": \"...\", \"name\": \"...\", \"role\": \"...\", \"description\": \"...\"}}]}}"
    )
}

// ── YouTube ──────────────────────────────────────────────────────────────

pub fn transcript_summary_prompt(transcript: &str) -> String {
    format!(
        "Summarize the YouTube video transcript in 250 words or less, focusing on key points: {transcript}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_is_exact() {
        assert_eq!(
            document_analysis_prompt("Hello", "INVOICE 123"),
            "Analyze this document:\nText: Hello\nOCR: INVOICE 123\nAnswer:\n1. Main topic?\n2. Charts/tables?\n3. Key info?"
        );
    }

    #[test]
    fn analyst_instructions_fill_every_slot() {
        let p = analyst_instructions("Robotics", "add a skeptic", 3);
        assert!(p.contains("review the research topic:\nRobotics"));
        assert!(p.contains("add a skeptic"));
        assert!(p.contains("Pick the top 3 themes."));
        assert!(p.contains("{\"analysts\": [{\"affiliation\""));
    }

    #[test]
    fn blog_prompts_quote_inputs() {
        assert_eq!(
            blog_refine_prompt("improve the intro", "Draft"),
            "Refine this blog based on feedback 'improve the intro':\nDraft"
        );
        assert!(blog_write_prompt("Rust", "facts").starts_with("Write a short, engaging blog post on 'Rust'"));
    }

    #[test]
    fn transcript_prompt_appends_transcript() {
        assert!(transcript_summary_prompt("abc").ends_with("focusing on key points: abc"));
    }
}
