use dimov_core::{CardRecord, RecordError};

use crate::UpdateFailed;

/// Parse the raw model reply into a complete record.
pub fn parse_reply(raw: &str) -> Result<CardRecord, UpdateFailed> {
    if raw.trim().is_empty() {
        return Err(UpdateFailed::EmptyReply);
    }

    let json_str = extract_json_object(raw)
        .ok_or_else(|| UpdateFailed::Malformed("no JSON object in reply".to_string()))?;

    CardRecord::from_complete_json(json_str).map_err(|e| match e {
        RecordError::MissingKeys(keys) => UpdateFailed::MissingKeys(keys),
        other => UpdateFailed::Malformed(other.to_string()),
    })
}

/// The first balanced `{...}` span. Braces inside JSON strings do not count,
/// so fences and prose after the object are ignored. A brace in prose before
/// the object still wins and the reply is rejected.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimov_core::CardField;

    fn full_reply() -> String {
        serde_json::to_string(&CardRecord::default()).unwrap()
    }

    #[test]
    fn plain_object_parses() {
        assert_eq!(parse_reply(&full_reply()), Ok(CardRecord::default()));
    }

    #[test]
    fn fenced_object_parses() {
        let raw = format!("```json\n{}\n```", full_reply());
        assert_eq!(parse_reply(&raw), Ok(CardRecord::default()));
    }

    #[test]
    fn braces_in_trailing_prose_are_ignored() {
        let raw = format!("{}\nNote: I kept {{other}} fields.", full_reply());
        assert_eq!(parse_reply(&raw), Ok(CardRecord::default()));
    }

    #[test]
    fn braces_inside_values_do_not_end_the_object() {
        let record = CardRecord::default().with_field(CardField::Slogan, "build {better} \"homes\"");
        let raw = format!("{} trailing }}", serde_json::to_string(&record).unwrap());
        assert_eq!(parse_reply(&raw), Ok(record));
    }

    #[test]
    fn blank_reply_is_empty() {
        assert_eq!(parse_reply("  \n"), Err(UpdateFailed::EmptyReply));
    }

    #[test]
    fn prose_without_object_is_malformed() {
        assert!(matches!(
            parse_reply("Sorry, I cannot help with that."),
            Err(UpdateFailed::Malformed(_))
        ));
    }

    #[test]
    fn truncated_object_is_malformed() {
        let reply = full_reply();
        let cut: String = reply.chars().take(reply.chars().count() / 2).collect();
        assert!(matches!(parse_reply(&cut), Err(UpdateFailed::Malformed(_))));
    }

    #[test]
    fn incomplete_object_lists_missing_keys() {
        let mut value = serde_json::to_value(CardRecord::default()).unwrap();
        value.as_object_mut().unwrap().remove("email2");
        let raw = value.to_string();
        assert_eq!(
            parse_reply(&raw),
            Err(UpdateFailed::MissingKeys(vec!["email2".to_string()]))
        );
    }
}
