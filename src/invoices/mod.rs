pub mod template;

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use bitcoin::bip32;
use bitcoin::{Amount, Denomination};

use crate::addresses::MasterKey;
use crate::validation::{self, ValidationError};
use template::InvoiceTemplate;

/// First hardened child index; invoice indices stay below it.
pub const HARDENED_INDEX_START: u32 = 1 << 31;

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("{0}")]
    Invalid(ValidationError),
    #[error("all {} non-hardened address indices have been used", HARDENED_INDEX_START)]
    IndexExhausted,
    #[error("address derivation failed: {0}")]
    Derivation(#[from] bip32::Error),
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub index: u32,
    pub amount_sats: u64,
    pub amount_btc: String,
    pub address: String,
    pub hash: String,
}

pub struct RenderedInvoice {
    pub invoice: Invoice,
    pub html: String,
}

/// Monotonic per-process address counter. Not persisted: restarts reuse indices.
#[derive(Debug)]
pub struct AddressIndex(AtomicU32);

impl AddressIndex {
    pub fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    /// Atomically hand out the current index and advance by one.
    pub fn reserve(&self) -> Option<u32> {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
                (i < HARDENED_INDEX_START).then_some(i + 1)
            })
            .ok()
    }

    /// Number of indices handed out so far.
    pub fn issued(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct InvoiceGenerator {
    master_key: MasterKey,
    template: InvoiceTemplate,
    base_url: String,
    next_index: AddressIndex,
    current_amount: AtomicU64,
}

impl InvoiceGenerator {
    pub fn new(
        master_key: MasterKey,
        template: InvoiceTemplate,
        base_url: impl Into<String>,
        default_amount: Amount,
    ) -> Self {
        Self {
            master_key,
            template,
            base_url: base_url.into(),
            next_index: AddressIndex::new(0),
            current_amount: AtomicU64::new(default_amount.to_sat()),
        }
    }

    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }

    pub fn issued(&self) -> u32 {
        self.next_index.issued()
    }

    pub fn current_amount(&self) -> Amount {
        Amount::from_sat(self.current_amount.load(Ordering::SeqCst))
    }

    /// Validate `raw_amount`, render an invoice at a freshly reserved index, and
    /// remember the amount for pull mode. A failed request leaves the amount untouched.
    pub fn issue_invoice(&self, raw_amount: &str) -> Result<RenderedInvoice, InvoiceError> {
        let amount = validation::parse_amount("amount", raw_amount).map_err(InvoiceError::Invalid)?;
        let rendered = self.issue_for(amount)?;
        self.current_amount.store(amount.to_sat(), Ordering::SeqCst);
        Ok(rendered)
    }

    /// Render an invoice for the last amount that was set.
    pub fn issue_current(&self) -> Result<RenderedInvoice, InvoiceError> {
        self.issue_for(self.current_amount())
    }

    fn issue_for(&self, amount: Amount) -> Result<RenderedInvoice, InvoiceError> {
        let index = self.next_index.reserve().ok_or(InvoiceError::IndexExhausted)?;
        let derived = self.master_key.derive_invoice_address(index)?;

        let invoice = Invoice {
            index,
            amount_sats: amount.to_sat(),
            amount_btc: format_btc(amount),
            address: derived.address.to_string(),
            hash: derived.hash_hex,
        };

        tracing::info!(
            index,
            address = %invoice.address,
            amount_sats = invoice.amount_sats,
            "New invoice"
        );

        let html = self.template.render(&[
            ("amount", invoice.amount_btc.as_str()),
            ("address", invoice.address.as_str()),
            ("hash", invoice.hash.as_str()),
            ("baseUrl", self.base_url.as_str()),
        ]);

        Ok(RenderedInvoice { invoice, html })
    }
}

/// Exact satoshi-to-BTC decimal, trailing fractional zeros trimmed.
pub fn format_btc(amount: Amount) -> String {
    amount.to_string_in(Denomination::Bitcoin)
}

/// BIP21 payment URI shown in the invoice QR code.
pub fn payment_uri(address: &str, amount: Amount) -> String {
    if amount == Amount::ZERO {
        format!("bitcoin:{}", address)
    } else {
        format!("bitcoin:{}?amount={}", address, format_btc(amount))
    }
}
