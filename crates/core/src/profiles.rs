use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_MAX_WORDS: usize = 180;

/// Learner preference record, read-only to the pipeline. Unknown or absent
/// fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub learning_style: String,
    pub level: String,
    pub language: String,
    pub constraints: Constraints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub max_words: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            learning_style: "visual".to_string(),
            level: "intermediate".to_string(),
            language: "en".to_string(),
            constraints: Constraints::default(),
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Reads `<profiles_dir>/<user_id>.json`. Any read or parse failure falls
/// back to the default profile; a missing profile is not an error.
pub fn load_profile(profiles_dir: &Path, user_id: &str) -> Profile {
    let path = profiles_dir.join(format!("{user_id}.json"));
    match fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
            debug!(file = %path.display(), %error, "profile unreadable, using defaults");
            Profile::default()
        }),
        Err(error) => {
            debug!(file = %path.display(), %error, "profile missing, using defaults");
            Profile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_profile, Profile, DEFAULT_MAX_WORDS};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_profile_falls_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = load_profile(dir.path(), "nobody");
        assert_eq!(profile.learning_style, "visual");
        assert_eq!(profile.constraints.max_words, DEFAULT_MAX_WORDS);
        Ok(())
    }

    #[test]
    fn stored_profile_is_read() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("ana.json"),
            r#"{"learning_style":"pragmatic","level":"advanced","language":"es","constraints":{"max_words":90}}"#,
        )?;

        let profile = load_profile(dir.path(), "ana");
        assert_eq!(profile.learning_style, "pragmatic");
        assert_eq!(profile.level, "advanced");
        assert_eq!(profile.constraints.max_words, 90);
        Ok(())
    }

    #[test]
    fn partial_profile_fills_missing_fields() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("leo.json"), r#"{"level":"beginner"}"#)?;

        let profile = load_profile(dir.path(), "leo");
        assert_eq!(profile.level, "beginner");
        assert_eq!(profile.learning_style, "visual");
        Ok(())
    }

    #[test]
    fn malformed_profile_falls_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("bad.json"), "{not json")?;

        let profile = load_profile(dir.path(), "bad");
        assert_eq!(profile.language, Profile::default().language);
        Ok(())
    }
}
