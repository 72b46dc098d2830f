use crate::Outcome;

/// Implemented by configuration structs that can validate and repair
/// themselves in place. Grounded on the teacher's `Config` trait
/// (`fe2o3_shield::cfg::Config`), trimmed of the JDAT-backed
/// serialization machinery that trait also carries there — this workspace
/// has no file-backed config store, only programmatically constructed
/// values, so only the validation contract survives.
pub trait Config {
    /// Validate the configuration, fixing anything that has an obvious,
    /// safe default and erroring on anything that doesn't.
    fn check_and_fix(&mut self) -> Outcome<()>;
}
