pub mod option;
pub mod user;
