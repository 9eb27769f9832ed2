pub mod auth;
pub mod branches;
pub mod companies;
