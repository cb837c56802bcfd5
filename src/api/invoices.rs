use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::invoices::{InvoiceError, InvoiceGenerator, RenderedInvoice};
use crate::validation::ValidationError;

#[derive(Debug, Deserialize)]
pub struct InvoiceForm {
    pub amount: Option<String>,
}

/// Push mode: create an invoice for the submitted amount.
pub async fn create(
    generator: web::Data<InvoiceGenerator>,
    form: web::Form<InvoiceForm>,
) -> HttpResponse {
    let Some(amount) = form.amount.as_deref() else {
        return HttpResponse::BadRequest().json(ValidationError::missing("amount").to_json());
    };

    respond(generator.issue_invoice(amount))
}

/// Pull mode: render an invoice for the last amount that was set.
pub async fn current(generator: web::Data<InvoiceGenerator>) -> HttpResponse {
    respond(generator.issue_current())
}

fn respond(result: Result<RenderedInvoice, InvoiceError>) -> HttpResponse {
    match result {
        Ok(rendered) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered.html),
        Err(InvoiceError::Invalid(e)) => {
            tracing::warn!(error = %e, "Rejected invoice request");
            HttpResponse::BadRequest().json(e.to_json())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue invoice");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to issue invoice"
            }))
        }
    }
}
