pub mod invoices;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use bitcoin::Amount;
use serde::Deserialize;

use crate::invoices::InvoiceGenerator;
use crate::validation;

/// Routes outside the kiosk's prefix.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}

async fn health(generator: web::Data<InvoiceGenerator>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "lemonade-stand",
        "version": env!("CARGO_PKG_VERSION"),
        "network": generator.master_key().network().to_string(),
        "issued": generator.issued(),
    }))
}

/// `/{prefix}` without the trailing slash: relative links in the pages only
/// resolve under `/{prefix}/`.
pub async fn redirect_to_slash(req: HttpRequest) -> HttpResponse {
    let location = match req.query_string() {
        "" => format!("{}/", req.path()),
        query => format!("{}/?{}", req.path(), query),
    };
    HttpResponse::PermanentRedirect()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub amount: Option<String>,
}

/// PNG QR code of the BIP21 URI for an invoice address.
pub async fn qr_code(
    generator: web::Data<InvoiceGenerator>,
    path: web::Path<String>,
    query: web::Query<QrQuery>,
) -> HttpResponse {
    let network = generator.master_key().network();
    let address = match validation::validate_bitcoin_address("address", &path, network) {
        Ok(a) => a,
        Err(e) => return HttpResponse::BadRequest().json(e.to_json()),
    };

    let amount = match query.amount.as_deref() {
        Some(raw) => match validation::parse_amount("amount", raw) {
            Ok(a) => a,
            Err(e) => return HttpResponse::BadRequest().json(e.to_json()),
        },
        None => Amount::ZERO,
    };

    let uri = crate::invoices::payment_uri(&address.to_string(), amount);

    match generate_qr_png(&uri) {
        Ok(png_bytes) => HttpResponse::Ok()
            .content_type("image/png")
            .body(png_bytes),
        Err(e) => {
            tracing::error!(error = %e, "QR generation failed");
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn generate_qr_png(data: &str) -> anyhow::Result<Vec<u8>> {
    use image::Luma;
    use qrcode::QrCode;

    let code = QrCode::new(data.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(250, 250)
        .build();

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{test, App};
    use bitcoin::Network;

    use super::*;
    use crate::addresses::MasterKey;
    use crate::config::InvoiceMode;
    use crate::invoices::template::InvoiceTemplate;
    use crate::node::Service;
    use crate::stand::LemonadeStand;

    const TEMPLATE: &str = "<h1>{{amount}}</h1><p>{{address}}</p><i>{{hash}}</i><a href=\"{{baseUrl}}\">back</a>";

    fn stand(mode: InvoiceMode) -> LemonadeStand {
        let key = MasterKey::from_seed(Network::Testnet, &[9u8; 32]).unwrap();
        let generator = InvoiceGenerator::new(
            key,
            InvoiceTemplate::new(TEMPLATE),
            "/lemonade-stand/",
            Amount::from_sat(12_340_000),
        );
        LemonadeStand::with_generator(Arc::new(generator), "lemonade-stand", mode, "static".into())
    }

    macro_rules! app {
        ($stand:expr) => {{
            let stand = $stand.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::from(stand.generator()))
                    .configure(configure)
                    .configure(move |cfg| stand.configure(cfg)),
            )
            .await
        }};
    }

    #[actix_rt::test]
    async fn test_post_invoice_renders_template() {
        let stand = stand(InvoiceMode::Push);
        let app = app!(stand);

        let req = test::TestRequest::post()
            .uri("/lemonade-stand/invoice")
            .set_form([("amount", "1.2345")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        let expected_address = stand
            .generator()
            .master_key()
            .derive_invoice_address(0)
            .unwrap();
        assert!(body.starts_with("<h1>1.2345</h1>"));
        assert!(body.contains(&expected_address.address.to_string()));
        assert!(body.contains(&expected_address.hash_hex));
        assert!(body.contains("href=\"/lemonade-stand/\""));
        assert_eq!(stand.generator().issued(), 1);
    }

    #[actix_rt::test]
    async fn test_post_invalid_amount_is_rejected() {
        let stand = stand(InvoiceMode::Push);
        let app = app!(stand);

        let req = test::TestRequest::post()
            .uri("/lemonade-stand/invoice")
            .set_form([("amount", "abc")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["field"], "amount");

        let req = test::TestRequest::post()
            .uri("/lemonade-stand/invoice")
            .set_form([("other", "1")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "amount is required");

        assert_eq!(stand.generator().issued(), 0);
    }

    #[actix_rt::test]
    async fn test_pull_mode_renders_last_amount() {
        let stand = stand(InvoiceMode::Pull);
        let app = app!(stand);

        let req = test::TestRequest::get().uri("/lemonade-stand/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"<h1>0.1234</h1>"));

        let req = test::TestRequest::post()
            .uri("/lemonade-stand/invoice")
            .set_form([("amount", "3")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get().uri("/lemonade-stand/").to_request();
        let body = test::read_body(test::call_service(&app, req).await).await;
        assert!(body.starts_with(b"<h1>3</h1>"));
        assert_eq!(stand.generator().issued(), 3);
    }

    #[actix_rt::test]
    async fn test_prefix_without_slash_redirects() {
        for mode in [InvoiceMode::Push, InvoiceMode::Pull] {
            let stand = stand(mode);
            let app = app!(stand);

            let req = test::TestRequest::get().uri("/lemonade-stand").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 308, "{:?}", mode);
            assert_eq!(
                resp.headers().get(header::LOCATION).unwrap(),
                "/lemonade-stand/"
            );
            assert_eq!(stand.generator().issued(), 0);
        }
    }

    #[actix_rt::test]
    async fn test_qr_code() {
        let stand = stand(InvoiceMode::Push);
        let address = stand
            .generator()
            .master_key()
            .derive_invoice_address(4)
            .unwrap()
            .address
            .to_string();
        let app = app!(stand);

        let req = test::TestRequest::get()
            .uri(&format!("/lemonade-stand/qr/{}?amount=0.5", address))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"\x89PNG"));

        let req = test::TestRequest::get()
            .uri("/lemonade-stand/qr/not-an-address")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::get()
            .uri(&format!("/lemonade-stand/qr/{}?amount=abc", address))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_rt::test]
    async fn test_health() {
        let stand = stand(InvoiceMode::Push);
        let app = app!(stand);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["network"], "testnet");
        assert_eq!(body["issued"], 0);
    }
}
