// Core modules: tag probing, slot registry, decoder, flattener, and errors.
pub mod decode;
pub mod discriminator;
pub mod error;
pub mod flatten;
pub mod schema;
pub mod variant;
