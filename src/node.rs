use actix_web::web;
use bitcoin::Network;

/// Handle the host node gives to each service it mounts.
#[derive(Clone, Debug)]
pub struct Node {
    pub network: Network,
    services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: String,
}

/// Lifecycle contract between the host node and a mounted service.
pub trait Service {
    fn name(&self) -> &'static str;

    /// Services the node must already provide before this one starts.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn start(&self) -> anyhow::Result<()>;

    fn stop(&self) -> anyhow::Result<()>;

    fn route_prefix(&self) -> &str;

    fn endpoints(&self) -> Vec<Endpoint>;

    fn configure(&self, cfg: &mut web::ServiceConfig);
}

impl Node {
    pub fn new(network: Network, services: Vec<String>) -> Self {
        Self { network, services }
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.iter().any(|s| s == name)
    }

    pub fn check_dependencies(&self, service: &dyn Service) -> anyhow::Result<()> {
        let missing: Vec<&str> = service
            .dependencies()
            .iter()
            .copied()
            .filter(|dep| !self.has_service(dep))
            .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "{} requires services not provided by the node: {}",
                service.name(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Check dependencies, start the service, and log what it serves.
    pub fn mount(&self, service: &dyn Service) -> anyhow::Result<()> {
        self.check_dependencies(service)?;
        service.start()?;
        tracing::info!(service = service.name(), prefix = %service.route_prefix(), "Service mounted");
        for endpoint in service.endpoints() {
            tracing::info!(
                service = service.name(),
                method = endpoint.method,
                path = %endpoint.path,
                "Endpoint mounted"
            );
        }
        Ok(())
    }
}
