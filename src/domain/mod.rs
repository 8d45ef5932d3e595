pub mod heart_rate;
pub mod models;
pub mod settings;
