pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::UserRepo;
pub use repo_types::{NewUser, User, UserId};
pub use services::CredentialStore;
