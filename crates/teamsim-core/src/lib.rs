#![deny(warnings)]
pub mod belief;
pub mod engine;
pub mod error;
pub mod model;
pub mod oracle;
pub mod prob;
pub mod scripted;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "teamsim"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "teamsim");
        assert!(!AppInfo::version().is_empty());
    }
}
