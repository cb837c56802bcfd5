//! Invoice address derivation from a single BIP32 master key.
//!
//! Every invoice address is the P2PKH address of the non-hardened child
//! `m/<index>`. Non-hardened children mean a leaked child private key plus the
//! master xpub reveals the master private key, and with it every invoice key.
//! That is acceptable for a demo kiosk only.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use bitcoin::bip32::{self, ChildNumber, Xpriv, Xpub};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Address, Network, NetworkKind};

pub struct DerivedAddress {
    pub address: Address,
    /// Hex of the HASH160 payload inside the address (not a hash of the string).
    pub hash_hex: String,
}

pub struct MasterKey {
    xpriv: Xpriv,
    network: Network,
    secp: Secp256k1<All>,
}

impl MasterKey {
    /// Generate a fresh master key from 32 random bytes.
    pub fn generate(network: Network) -> Result<Self> {
        let seed: [u8; 32] = rand::random();
        Self::from_seed(network, &seed)
    }

    pub fn from_seed(network: Network, seed: &[u8]) -> Result<Self> {
        let xpriv = Xpriv::new_master(network, seed)
            .map_err(|e| anyhow!("master key generation failed: {}", e))?;
        Ok(Self {
            xpriv,
            network,
            secp: Secp256k1::new(),
        })
    }

    /// Parse an xprv/tprv string; its network kind must agree with `network`.
    pub fn from_xprv(network: Network, xprv: &str) -> Result<Self> {
        let xpriv = Xpriv::from_str(xprv.trim())
            .map_err(|e| anyhow!("MASTER_XPRV is not a valid extended private key: {}", e))?;
        if xpriv.network != NetworkKind::from(network) {
            return Err(anyhow!(
                "MASTER_XPRV network does not match NETWORK={}",
                network
            ));
        }
        Ok(Self {
            xpriv,
            network,
            secp: Secp256k1::new(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn fingerprint(&self) -> String {
        self.xpriv.fingerprint(&self.secp).to_string()
    }

    pub fn xpub(&self) -> Xpub {
        Xpub::from_priv(&self.secp, &self.xpriv)
    }

    /// Derive the receiving address at `m/<index>`. Pure: the same index always
    /// yields the same address. Fails for indices in the hardened range.
    pub fn derive_invoice_address(&self, index: u32) -> Result<DerivedAddress, bip32::Error> {
        let child = ChildNumber::from_normal_idx(index)?;
        let derived = self.xpriv.derive_priv(&self.secp, &[child])?;
        let public_key = derived.to_priv().public_key(&self.secp);
        let pubkey_hash = public_key.pubkey_hash();
        let address = Address::p2pkh(pubkey_hash, self.network);

        Ok(DerivedAddress {
            address,
            hash_hex: hex::encode(pubkey_hash.to_byte_array()),
        })
    }
}
