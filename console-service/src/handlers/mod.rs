pub mod account;
pub mod approval;
pub mod auth;
pub mod directory;
pub mod invitation;
