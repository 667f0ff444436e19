//! Server configuration

use std::net::SocketAddr;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Listener page, relative to the public directory
    pub home_page: String,

    /// Controller page, relative to the public directory
    pub controller_page: String,

    /// Where `/` redirects to
    pub home_location: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            home_page: "home/index.html".to_string(),
            controller_page: "controller/index.html".to_string(),
            home_location: "/home".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the port, keeping the bind IP
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the listener and controller pages
    pub fn pages(mut self, home: impl Into<String>, controller: impl Into<String>) -> Self {
        self.home_page = home.into();
        self.controller_page = controller.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.home_page, "home/index.html");
        assert_eq!(config.controller_page, "controller/index.html");
        assert_eq!(config.home_location, "/home");
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.home_location, "/home");
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .port(4000)
            .pages("listen.html", "admin.html");

        assert_eq!(config.bind_addr, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.home_page, "listen.html");
        assert_eq!(config.controller_page, "admin.html");
    }
}
