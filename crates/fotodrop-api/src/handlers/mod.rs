pub mod auth;
pub mod qr;
pub mod upload;
