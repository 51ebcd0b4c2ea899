use serde::Serialize;

/// A registered user as held by the user store
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// User ID, assigned by the store
    pub id: u64,
    pub username: String,
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
}

impl User {
    pub fn new(id: u64, username: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
        }
    }

    /// Public view of the user, safe to return to clients
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Fields for a user that has not been assigned an ID yet
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, serde::Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
}
