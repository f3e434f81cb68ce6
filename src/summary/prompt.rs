//! Prompt templates for the nutrition summary

/// System instruction sent with every summary request
pub const SYSTEM_PROMPT: &str = "\
You are an expert nutrition analyst and food scientist.
Your task is to analyze the provided raw text from an OCR scan of a food product label.

Analyze and summarize the data according to the following guidelines:
1.  **Key Ingredients:** List the first 5-7 major ingredients.
2.  **Nutritional Highlights:** State the values for Energy (Calories), Total Fat, Total Sugar, and Total Sodium *per serving*.
3.  **Overall Assessment:** Provide a single, short paragraph (max 100 words) summarizing whether the product is high or low in sodium, fat, or sugar based on general health guidelines.

Format your response clearly, using a professional and factual tone.
Do not include any bullet points or lists in the final response. Structure it as a cohesive report.
";

/// Render OCR text and formatted labels into the user message.
///
/// Both inputs are embedded verbatim; the label section is omitted when
/// there are no labels.
pub fn render_user_content(ocr_text: &str, labels: &[String]) -> String {
    let mut content = String::from("--- RAW OCR TEXT ---\n");
    content.push_str(ocr_text);
    content.push_str("\n\n");

    if !labels.is_empty() {
        content.push_str("--- DETECTED OBJECTS/SCENE LABELS ---\n");
        content.push_str(&labels.join(", "));
        content.push('\n');
    }

    content.push_str("\n--- END OF DATA ---");
    content
}
