/// Application layer
///
/// - `services`: revision lookup, command construction, prompt handling, relay delivery
/// - `use_cases`: deployment operations on one host or a whole fleet
pub mod services;
pub mod use_cases;
