pub mod admin;
pub mod discord;
pub mod extract;
pub mod health;
pub mod pages;
pub mod servers;
