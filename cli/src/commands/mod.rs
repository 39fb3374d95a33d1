pub mod connect;
pub mod health;
pub mod login;
pub mod tools;
