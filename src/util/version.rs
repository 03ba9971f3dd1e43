pub const APP_SLUG: &str = "export-logistics-quoter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_label() -> String {
    format!("v{APP_VERSION}")
}

/// Sent with every outbound request.
pub fn user_agent() -> String {
    format!("{APP_SLUG}/{}", version_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_app_and_version() {
        let agent = user_agent();
        assert!(agent.starts_with("export-logistics-quoter/v"));
        assert!(agent.ends_with(APP_VERSION));
    }
}
