//! The system prompt.

use parley_constant::defaults::IMAGE_REQUEST_MARKER;
use parley_core::Turn;

#[derive(Debug, Clone)]
pub struct Persona {
    instructions: String,
}

impl Persona {
    /// Built-in instructions for a bot called `name`.
    pub fn new(name: &str) -> Self {
        let lines = [
            format!("You are {name}, a personal AI assistant."),
            "If asked for code you return it in markdown code block format.".to_string(),
            format!(
                "If asked to generate an image in any way, you will respond with \
                 '{IMAGE_REQUEST_MARKER}' followed by the prompt. This will automatically \
                 trigger an API call to an image model, effectively allowing you to generate \
                 images directly."
            ),
            "You always try to keep your answers as short and concise as possible unless asked otherwise."
                .to_string(),
        ];
        Self {
            instructions: lines.join(" "),
        }
    }

    pub fn custom(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// System turn for a request, optionally naming the person being addressed.
    pub fn system_turn(&self, talking_to: Option<&str>) -> Turn {
        let text = match talking_to.filter(|n| !n.trim().is_empty()) {
            Some(name) => format!("{} You are talking to {name}", self.instructions),
            None => self.instructions.clone(),
        };
        Turn::system().with_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Role;

    #[test]
    fn test_mentions_marker_and_name() {
        let persona = Persona::new("Parley");
        assert!(persona.instructions().starts_with("You are Parley"));
        assert!(persona.instructions().contains(IMAGE_REQUEST_MARKER));
    }

    #[test]
    fn test_system_turn_annotation() {
        let turn = Persona::custom("Be brief.").system_turn(Some("Ada Lovelace"));
        assert_eq!(turn.role, Role::System);
        assert_eq!(turn.text(), "Be brief. You are talking to Ada Lovelace");

        let anonymous = Persona::custom("Be brief.").system_turn(Some("  "));
        assert_eq!(anonymous.text(), "Be brief.");
    }
}
