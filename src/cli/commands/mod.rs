pub mod fact;
pub mod resource;
pub mod shell;
pub mod token;
