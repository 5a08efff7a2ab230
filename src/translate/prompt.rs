use super::TranslationRequest;

pub const SYSTEM_PROMPT: &str = "You are a professional translation assistant.";

const EXAMPLE_INPUT: &str = "1
00:00:01,000 --> 00:00:03,000
Hello, how are you?

2
00:00:04,000 --> 00:00:06,000
I'm doing great, thank you.";

const EXAMPLE_OUTPUT: &str = "1
00:00:01,000 --> 00:00:03,000
Hola, ¿cómo estás?

2
00:00:04,000 --> 00:00:06,000
Estoy muy bien, gracias.";

/// Build the user prompt for one translation request.
pub fn build_prompt(request: &TranslationRequest) -> String {
    let language = &request.target_language;

    format!(
        "You are a professional subtitle translator. Translate the content of the SRT file below into {language}.\n\
         \n\
         Follow these rules:\n\
         1. Keep every block number and every timecode exactly as in the input. Do not merge, split, renumber or drop blocks.\n\
         2. Keep each subtitle's length close to the original so it stays in sync with the video.\n\
         3. Preserve context and cultural nuance; prefer natural {language} expressions over word-for-word translation.\n\
         4. Output only the translated SRT text: numbers, timecodes and translated lines. No comments, notes or explanations.\n\
         \n\
         Example input:\n\
         {EXAMPLE_INPUT}\n\
         \n\
         Example output:\n\
         {EXAMPLE_OUTPUT}\n\
         \n\
         Input:\n\
         {document}\n",
        language = language,
        document = request.document_text.trim_end(),
    )
}
