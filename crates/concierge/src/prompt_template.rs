use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

const SYSTEM_TEMPLATE_NAME: &str = "system.md";

/// Template of the system prompt sent with every chat turn
pub const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");

#[derive(Serialize)]
struct SystemPromptContext<'a> {
    instructions: &'a str,
    tools: &'a [Tool],
}

/// Render a tera template against any serializable context
pub fn render<T: Serialize>(name: &str, template: &str, context: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)?;
    tera.render(name, &Context::from_serialize(context)?)
}

/// The concierge system prompt: fixed instructions followed by the tool list
/// and the HTML answer format
pub fn render_system_prompt(instructions: &str, tools: &[Tool]) -> Result<String, TeraError> {
    render(
        SYSTEM_TEMPLATE_NAME,
        SYSTEM_PROMPT,
        &SystemPromptContext {
            instructions,
            tools,
        },
    )
}
