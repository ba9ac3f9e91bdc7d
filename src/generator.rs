//! Automation generator
//!
//! Asks Gemini to write an automation for a plain-language description and
//! cleans the reply into bare YAML.

use serde_json::Value;
use tracing::{info, warn};

use crate::clients::GeminiClient;
use crate::config::AppState;

/// Most entity records embedded in a prompt.
pub const MAX_PROMPT_ENTITIES: usize = 50;

/// Service the model sometimes invents for Telegram messages.
pub const DEPRECATED_TELEGRAM_SERVICE: &str = "notify.telegram";

/// The service Telegram messages must use.
pub const TELEGRAM_SERVICE: &str = "telegram_bot.send_message";

/// Generate automation YAML for a description.
///
/// Always returns text: on failure the text is a readable error message.
pub async fn generate(state: &AppState, description: &str, entities: &[Value]) -> String {
    let prompt = build_prompt(description, entities);
    let gemini = GeminiClient::new(state);

    match gemini.generate(&state.config.gemini_model, &prompt).await {
        Ok(reply) => {
            info!(chars = reply.len(), "Automation generated");
            clean_generated(&reply)
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Automation generation failed");
            format!("Generation error: {}", e)
        }
    }
}

/// Strip markdown fences and repair the Telegram service name.
pub fn clean_generated(reply: &str) -> String {
    let yaml = reply
        .trim()
        .replace("```yaml", "")
        .replace("```yml", "")
        .replace("```", "");
    let yaml = yaml.trim();

    if yaml.contains(DEPRECATED_TELEGRAM_SERVICE) {
        warn!(
            "Model used {} instead of {}, rewriting",
            DEPRECATED_TELEGRAM_SERVICE, TELEGRAM_SERVICE
        );
        return yaml.replace(DEPRECATED_TELEGRAM_SERVICE, TELEGRAM_SERVICE);
    }

    yaml.to_string()
}

/// Prompt embedding the description and up to [`MAX_PROMPT_ENTITIES`] entities.
pub fn build_prompt(description: &str, entities: &[Value]) -> String {
    let entities = if entities.is_empty() {
        "No entities selected".to_string()
    } else {
        let shown = &entities[..entities.len().min(MAX_PROMPT_ENTITIES)];
        serde_json::to_string_pretty(shown).unwrap_or_default()
    };

    format!(
        r#"You are a Home Assistant expert. Generate a YAML automation based on this description:

DESCRIPTION: {description}

AVAILABLE ENTITIES: {entities}

IMPORTANT RULES:
1. Return ONLY pure YAML code (no markdown or backticks)
2. Always include: alias, description, trigger, action, mode
3. For Telegram ALWAYS use: {telegram} (NOT {deprecated}!)
4. For generic notifications use: notify.mobile_app or notify.persistent_notification
5. Use provided entities when possible
6. YAML must be valid and complete

CORRECT FORMAT EXAMPLES:

Telegram (IMPORTANT - use {telegram}):
action:
  - service: {telegram}
    data:
      message: "Your message here"

Telegram with specific target:
action:
  - service: {telegram}
    data:
      message: "Your message"
      target: 123456789

Mobile App Notification:
action:
  - service: notify.mobile_app
    data:
      message: "Your message here"
      title: "Optional title"

Persistent Notification:
action:
  - service: notify.persistent_notification
    data:
      message: "Notification visible in HA"

Light:
action:
  - service: light.turn_on
    entity_id: light.kitchen
    data:
      brightness_pct: 80

Climate:
action:
  - service: climate.set_temperature
    entity_id: climate.heating
    data:
      temperature: 20

WARNING: For Telegram ALWAYS use "{telegram}", NEVER "{deprecated}"!

Generate the automation now (ONLY YAML, no markdown):"#,
        description = description,
        entities = entities,
        telegram = TELEGRAM_SERVICE,
        deprecated = DEPRECATED_TELEGRAM_SERVICE,
    )
}
