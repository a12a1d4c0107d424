use serde::{Deserialize, Serialize};

use crate::{config::Stage, error::AppError, registry::KeysAndCertificate};

/// Incoming payload for `POST /init`.
#[derive(Debug, Deserialize)]
pub struct InitPayload {
    pub id: String,
}

impl InitPayload {
    /// Reject blank ids. Accepted ids are used verbatim in the thing name.
    pub fn device_id(&self) -> Result<&str, AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::InvalidRequest("`id` must not be empty".into()));
        }
        Ok(&self.id)
    }
}

/// Name of the thing registered for `device_id`. Production things carry no stage suffix.
pub fn thing_name(device_id: &str, stage: &Stage) -> String {
    if stage.is_production() {
        format!("thing-{device_id}")
    } else {
        format!("thing-{device_id}-{stage}")
    }
}

/// Key material exactly as returned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    #[serde(rename = "PublicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(rename = "PrivateKey")]
    pub private_key: String,
}

/// Certificate material handed back to the device on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateBundle {
    pub certificate_arn: String,
    pub certificate_id: String,
    pub certificate_pem: String,
    pub keypair: KeyPair,
}

impl TryFrom<KeysAndCertificate> for CertificateBundle {
    type Error = AppError;

    fn try_from(raw: KeysAndCertificate) -> Result<Self, Self::Error> {
        let KeysAndCertificate {
            certificate_arn,
            certificate_id,
            certificate_pem,
            key_pair,
        } = raw;
        match (certificate_arn, certificate_id, certificate_pem, key_pair) {
            (Some(certificate_arn), Some(certificate_id), Some(certificate_pem), Some(pair)) => {
                let private_key = pair.private_key.ok_or(AppError::IncompleteIssuance)?;
                Ok(Self {
                    certificate_arn,
                    certificate_id,
                    certificate_pem,
                    keypair: KeyPair {
                        public_key: pair.public_key,
                        private_key,
                    },
                })
            }
            _ => Err(AppError::IncompleteIssuance),
        }
    }
}
