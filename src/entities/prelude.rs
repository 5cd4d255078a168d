pub use super::options::Entity as Options;
pub use super::users::Entity as Users;
