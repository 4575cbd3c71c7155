pub mod components;
pub mod create;
pub mod export;
pub mod inspect;
pub mod settings;
