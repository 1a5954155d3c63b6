// Seva - conversational grievance-filing assistant
// Library exports

pub mod agent; // Chat turn loop
pub mod chat; // UI conversation model
pub mod claude;
pub mod config;
pub mod errors;
pub mod grm; // Grievance backend client
pub mod scheme;
pub mod server;
pub mod speech;
pub mod stream; // Response data stream
pub mod tools; // Tool registry, confirmation gate and processor
