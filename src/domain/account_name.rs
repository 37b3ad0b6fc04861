use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct AccountName(String);

impl AccountName {
    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim().to_string();
        let is_empty = s.is_empty();
        let is_too_long = s.graphemes(true).count() > 256;

        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_chars = s.chars().any(|c| forbidden_characters.contains(&c));

        if is_empty || is_too_long || contains_forbidden_chars {
            Err(format!("{} is not a valid account name.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
