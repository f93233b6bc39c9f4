// Handler modules
pub mod audit;
pub mod codes;

// Re-export all handler functions
pub use audit::handle_audit;
pub use codes::handle_codes;
