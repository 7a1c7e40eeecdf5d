use serde::{Deserialize, Deserializer, de::Error};

/// Rejects missing, null and whitespace-only strings
pub fn disallow_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let input_string: Option<String> = Option::deserialize(deserializer)?;

    let Some(value) = input_string else {
        return Err(Error::custom("field is null"));
    };

    if value.trim().is_empty() {
        return Err(Error::custom("field is empty"));
    }

    Ok(value)
}
