use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand::Rng;

/// A persisted bank account.
///
/// `number` is the public identifier used by every monetary operation; `id`
/// is the storage key. The password hash never leaves the server.
#[derive(Debug, Default, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub number: i32,
    pub hashed_password: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds an unsaved account with a hashed password, a random number and
    /// a zero balance.
    pub fn new(
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        Ok(Account {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            number: Self::generate_number(),
            hashed_password,
            balance: 0,
            created_at: Utc::now(),
            ..Default::default()
        })
    }

    /// Random non-negative 31-bit account number.
    pub fn generate_number() -> i32 {
        rand::thread_rng().gen_range(0..=i32::MAX)
    }

    /// Checks `password` against the stored hash.
    pub fn password_matches(&self, password: &str) -> Result<(), argon2::password_hash::Error> {
        let hash = PasswordHash::new(&self.hashed_password)?;
        Argon2::default().verify_password(password.as_bytes(), &hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_empty() {
        let account = Account::new("Code", "Sensei", "password").unwrap();
        assert_eq!(account.balance, 0);
        assert!(account.number >= 0);
        assert_eq!(account.first_name, "Code");
        assert_eq!(account.last_name, "Sensei");
    }

    #[test]
    fn password_is_hashed_and_verifiable() {
        let account = Account::new("Ada", "Lovelace", "hunter2").unwrap();
        assert_ne!(account.hashed_password, "hunter2");
        assert!(account.password_matches("hunter2").is_ok());
        assert!(account.password_matches("hunter3").is_err());
    }

    #[test]
    fn generated_numbers_stay_in_range() {
        for _ in 0..1_000 {
            let number = Account::generate_number();
            assert!((0..=i32::MAX).contains(&number));
        }
    }
}
