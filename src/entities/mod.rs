pub mod prelude;

pub mod animals;
pub mod tokens;
pub mod users;
