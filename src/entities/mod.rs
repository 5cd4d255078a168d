pub mod prelude;

pub mod options;
pub mod users;
