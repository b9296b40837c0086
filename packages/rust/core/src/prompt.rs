//! Authoring prompt composition.
//!
//! The prompt is a pure function of its inputs: same topic, context and
//! options always yield byte-identical text.

use lessonforge_shared::AuthoringConfig;
use lessonforge_template::{CLOSE_MARKER, OPEN_MARKER};

/// Authoring constraints embedded in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub min_modules: u32,
    pub max_modules: u32,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self::from(&AuthoringConfig::default())
    }
}

impl From<&AuthoringConfig> for PromptOptions {
    fn from(config: &AuthoringConfig) -> Self {
        Self {
            min_modules: config.min_modules,
            max_modules: config.max_modules,
        }
    }
}

/// Compose the prompt with default authoring constraints.
pub fn compose_prompt(topic: &str, classroom_context: Option<&str>) -> String {
    compose_prompt_with(topic, classroom_context, &PromptOptions::default())
}

/// Compose the instruction text sent to the generative service.
pub fn compose_prompt_with(
    topic: &str,
    classroom_context: Option<&str>,
    opts: &PromptOptions,
) -> String {
    let topic = topic.trim();
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are an expert computer science educator. Create a detailed coding assignment \
         based on this short description: \"",
    );
    prompt.push_str(topic);
    prompt.push_str("\"\n\n");

    if let Some(context) = classroom_context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("Classroom context: ");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Structure the assignment as an interactive tutorial made of progressive modules.\n\
         For each module:\n\
         1. Write clear learning text explaining the concept.\n",
    );
    prompt.push_str(&format!(
        "2. Provide a code template and wrap the parts students must complete in \
         {OPEN_MARKER}...{CLOSE_MARKER} tags.\n"
    ));
    prompt.push_str(
        "3. Include helpful hints.\n\
         4. Describe the expected output.\n\n",
    );

    prompt.push_str("Return your response as a single JSON object with this structure:\n");
    prompt.push_str(&output_shape());
    prompt.push('\n');

    prompt.push_str("Constraints:\n");
    prompt.push_str(&format!(
        "- Produce between {} and {} modules that break the assignment into logical learning steps.\n",
        opts.min_modules, opts.max_modules
    ));
    prompt.push_str(
        "- Each module must build progressively on the previous modules.\n\
         - Put required imports and setup code in the first module.\n\
         - The final module must include self-check code that runs the solution and prints \
         results demonstrating that it works.\n\
         - Every codeTemplate must be valid, executable code once its editable sections are \
         completed.\n",
    );
    prompt.push_str(&format!(
        "- Use lower-case {OPEN_MARKER} and {CLOSE_MARKER} tags exactly as written; do not \
         use any other spelling.\n"
    ));
    prompt.push_str(
        "- Set \"targetLanguage\" (for example \"Python\" or \"JavaScript\") and list any \
         libraries students need in \"dependencies\".\n\
         - Return only well-formed JSON, with no commentary before or after it.\n",
    );

    prompt
}

/// The JSON skeleton the model is asked to fill in.
fn output_shape() -> String {
    format!(
        r#"{{
  "assignment": {{
    "title": "Assignment title",
    "description": "Overall description of the assignment",
    "targetLanguage": "Python",
    "dependencies": ["numpy"],
    "modules": [
      {{
        "id": 1,
        "title": "Module title",
        "learningText": "Explanatory text for this module",
        "codeTemplate": "Full code with {OPEN_MARKER}student code here{CLOSE_MARKER} tags",
        "hints": ["Hint 1", "Hint 2"],
        "expectedOutput": "Description of the expected output"
      }}
    ]
  }}
}}
"#
    )
}
