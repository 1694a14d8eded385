pub mod prelude;

pub mod products;
pub mod reports;
pub mod users;
