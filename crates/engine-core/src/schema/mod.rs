pub mod materializer;
pub mod reflector;
