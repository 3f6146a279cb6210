use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Prompt config has no sections")]
    Empty,
}

/// Sections of the system prompt. Rendered once at startup and reused for every call.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub background: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub output_instructions: Vec<String>,
}

impl PromptConfig {
    pub fn diet_assistant() -> Self {
        Self {
            background: vec![
                "This assistant is an expert in diet, nutrition, and healthy eating habits.".to_string(),
            ],
            steps: vec![
                "Understand the user's input about diet and provide an accurate response.".to_string(),
            ],
            output_instructions: vec![
                "Only answer diet-related queries. If the question is unrelated to diet, politely decline to answer.".to_string(),
                "Provide clear, evidence-based dietary advice.".to_string(),
                "Be friendly and professional in all interactions.".to_string(),
            ],
        }
    }

    fn is_empty(&self) -> bool {
        self.background.is_empty() && self.steps.is_empty() && self.output_instructions.is_empty()
    }

    pub fn generate(&self) -> String {
        let sections = [
            ("IDENTITY and PURPOSE", &self.background),
            ("INTERNAL ASSISTANT STEPS", &self.steps),
            ("OUTPUT INSTRUCTIONS", &self.output_instructions),
        ];

        sections
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(title, items)| {
                let lines = items
                    .iter()
                    .map(|item| format!("- {}", item))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("# {}\n{}", title, lines)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    if config.is_empty() {
        return Err(PromptError::Empty);
    }
    Ok(config)
}

pub fn load_prompts(path: &str) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(path)?;
    load_prompts_from_str(&file_content)
}

/// Built-in diet prompt unless a path is given.
pub fn resolve_prompt_config(path: Option<&str>) -> Result<PromptConfig, PromptError> {
    match path {
        Some(p) => load_prompts(p),
        None => Ok(PromptConfig::diet_assistant()),
    }
}
