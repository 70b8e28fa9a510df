pub mod health;
pub mod migrate;
