use secrecy::{ExposeSecret, SecretString};

const MIN_LENGTH: usize = 6;
const MAX_LENGTH: usize = 128;

pub struct AccountPassword(SecretString);

impl AccountPassword {
    pub fn parse(s: SecretString) -> Result<Self, String> {
        let length = s.expose_secret().chars().count();
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(format!(
                "The password must be between {MIN_LENGTH} and {MAX_LENGTH} characters long."
            ));
        }
        Ok(Self(s))
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }
}

impl std::fmt::Debug for AccountPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccountPassword([REDACTED])")
    }
}
