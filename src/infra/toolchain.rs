//! Host program discovery

/// First of `candidates` present in `PATH`, or `fallback` as a bare name
pub fn preferred_program(candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .find_map(|name| which::which(name).ok())
        .map_or_else(|| fallback.to_string(), |p| p.display().to_string())
}
