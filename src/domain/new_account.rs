use secrecy::SecretString;

use super::{AccountName, AccountPassword, SubscriberEmail};

#[derive(Debug)]
pub struct NewAccount {
    pub email: SubscriberEmail,
    pub name: AccountName,
    pub password: AccountPassword,
}

impl NewAccount {
    pub fn parse(email: String, name: String, password: SecretString) -> Result<Self, String> {
        let email = SubscriberEmail::parse(email)?;
        let name = AccountName::parse(name)?;
        let password = AccountPassword::parse(password)?;
        Ok(Self {
            email,
            name,
            password,
        })
    }
}
