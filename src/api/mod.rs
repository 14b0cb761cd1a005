//! Admin and JSON API accessors under `/~/api/`.

mod accounts;
mod client;
mod config;

pub use accounts::Account;
pub use config::{ConfigFilter, VfsNode, Who};

/// Path of a named API endpoint.
pub(crate) fn endpoint(name: &str) -> String {
    format!("/~/api/{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(endpoint("get_file_list"), "/~/api/get_file_list");
    }
}
