use std::path::PathBuf;
use std::sync::Arc;

use actix_web::web;
use bitcoin::Amount;

use crate::addresses::MasterKey;
use crate::api;
use crate::config::{Config, InvoiceMode};
use crate::invoices::template::InvoiceTemplate;
use crate::invoices::InvoiceGenerator;
use crate::node::{Endpoint, Node, Service};

/// The payment kiosk: invoice page plus static assets under one route prefix.
#[derive(Clone)]
pub struct LemonadeStand {
    generator: Arc<InvoiceGenerator>,
    route_prefix: String,
    mode: InvoiceMode,
    static_dir: PathBuf,
}

impl LemonadeStand {
    /// Load the template and master key. Any failure here must stop startup.
    pub fn new(node: &Node, config: &Config) -> anyhow::Result<Self> {
        let template = InvoiceTemplate::load(&config.template_path)?;

        let master_key = match &config.master_xprv {
            Some(xprv) => MasterKey::from_xprv(node.network, xprv)?,
            None => MasterKey::generate(node.network)?,
        };
        tracing::info!(
            fingerprint = %master_key.fingerprint(),
            xpub = %master_key.xpub(),
            "Using key"
        );

        let generator = InvoiceGenerator::new(
            master_key,
            template,
            config.base_url(),
            Amount::from_sat(config.default_amount_sats),
        );

        Ok(Self::with_generator(
            Arc::new(generator),
            &config.route_prefix,
            config.invoice_mode,
            config.static_dir.clone(),
        ))
    }

    pub fn with_generator(
        generator: Arc<InvoiceGenerator>,
        route_prefix: &str,
        mode: InvoiceMode,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            generator,
            route_prefix: route_prefix.to_string(),
            mode,
            static_dir,
        }
    }

    pub fn generator(&self) -> Arc<InvoiceGenerator> {
        self.generator.clone()
    }
}

impl Service for LemonadeStand {
    fn name(&self) -> &'static str {
        "lemonade-stand"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["bitcoind"]
    }

    fn start(&self) -> anyhow::Result<()> {
        tracing::info!(prefix = %self.route_prefix, mode = ?self.mode, "Lemonade stand started");
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(issued = self.generator.issued(), "Lemonade stand stopped");
        Ok(())
    }

    fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    fn endpoints(&self) -> Vec<Endpoint> {
        let prefix = format!("/{}", self.route_prefix);
        let mut endpoints = vec![
            Endpoint { method: "GET", path: prefix.clone() },
            Endpoint { method: "POST", path: format!("{}/invoice", prefix) },
            Endpoint { method: "GET", path: format!("{}/qr/{{address}}", prefix) },
        ];
        if self.mode == InvoiceMode::Pull {
            endpoints.push(Endpoint { method: "GET", path: format!("{}/", prefix) });
        }
        endpoints.push(Endpoint { method: "GET", path: format!("{}/*", prefix) });
        endpoints
    }

    fn configure(&self, cfg: &mut web::ServiceConfig) {
        let mut scope = web::scope(&format!("/{}", self.route_prefix))
            .app_data(web::Data::from(self.generator.clone()))
            .app_data(web::FormConfig::default().limit(4096))
            .route("", web::get().to(api::redirect_to_slash))
            .route("/invoice", web::post().to(api::invoices::create))
            .route("/qr/{address}", web::get().to(api::qr_code));

        if self.mode == InvoiceMode::Pull {
            scope = scope.route("/", web::get().to(api::invoices::current));
        }

        // Static assets last so the routes above win.
        cfg.service(
            scope.service(actix_files::Files::new("/", &self.static_dir).index_file("index.html")),
        );
    }
}
