mod addresses;
mod api;
mod config;
mod invoices;
mod node;
mod stand;
mod validation;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use node::{Node, Service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lemonade_stand=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let node = Node::new(config.network, config.node_services.clone());

    let stand = stand::LemonadeStand::new(&node, &config)?;
    node.mount(&stand)?;

    let bind_addr = format!("{}:{}", config.api_host, config.api_port);

    tracing::info!(
        network = %config.network,
        api = %bind_addr,
        prefix = %config.route_prefix,
        mode = ?config.invoice_mode,
        "Lemonade stand starting"
    );

    let server_stand = stand.clone();
    HttpServer::new(move || {
        let cors = if config.is_testnet() || config.allowed_origins.is_empty() {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);
            for origin in &config.allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        let stand = server_stand.clone();
        App::new()
            .wrap(cors)
            .app_data(web::Data::from(stand.generator()))
            .configure(api::configure)
            .configure(move |cfg| stand.configure(cfg))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    stand.stop()?;

    Ok(())
}
