pub mod credentials;
pub mod signature;
pub mod token;

pub use credentials::{Assumed, Credentials, Direct, Simple};
