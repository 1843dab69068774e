use dimov_core::CardRecord;

pub fn system_prompt() -> String {
    "You are an AI assistant helping a user edit a business card. \
You receive the current JSON state of the card and a request from the user.\n\n\
Instructions:\n\
1. Analyze the user's request. It might be in Bulgarian or English.\n\
2. Update the JSON state based on the request (e.g. \"change phone for Plamen to X\").\n\
3. Return the FULL updated JSON object, including every field the request did not touch, \
with those values copied unchanged.\n\
4. If the user wants to translate content, translate the relevant fields.\n\
5. Maintain the structure exactly: the same keys, every value a string, no extra keys.\n\n\
Output ONLY the JSON object, nothing else."
        .to_string()
}

pub fn user_message(current: &CardRecord, instruction: &str) -> String {
    // A struct of plain strings always serializes.
    let state = serde_json::to_string(current).unwrap_or_default();
    format!(
        "Current JSON state of the card:\n{}\n\nUser Request: \"{}\"",
        state, instruction
    )
}

/// JSON schema for the reply: one object, fourteen required string properties.
pub fn response_schema() -> serde_json::Value {
    let mut schema = schemars::schema_for!(CardRecord).to_value();
    if let Some(map) = schema.as_object_mut() {
        // Providers reject the meta keys in response schemas.
        map.remove("$schema");
        map.remove("title");
    }
    schema
}
