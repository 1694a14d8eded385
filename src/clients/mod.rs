pub mod mail;

pub use mail::{HttpMailer, Mailer, NullMailer};
