//! Device registry seam.
//!
//! The issuance pipeline only talks to [`DeviceRegistry`]; [`IotRegistry`] is the
//! AWS IoT Core implementation used by the Lambda binary.

use async_trait::async_trait;
use aws_sdk_iot::{
    error::{DisplayErrorContext, ProvideErrorMetadata},
    Client,
};
use thiserror::Error;

/// Registry calls made during issuance, named after the IoT API actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOperation {
    CreateThing,
    CreateKeysAndCertificate,
    AttachPolicy,
    AttachThingPrincipal,
}

impl RegistryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryOperation::CreateThing => "CreateThing",
            RegistryOperation::CreateKeysAndCertificate => "CreateKeysAndCertificate",
            RegistryOperation::AttachPolicy => "AttachPolicy",
            RegistryOperation::AttachThingPrincipal => "AttachThingPrincipal",
        }
    }
}

/// A failed registry call. Transient and permanent faults are not distinguished.
#[derive(Debug, Clone, Error)]
#[error("{} failed: {message}", .operation.as_str())]
pub struct RegistryError {
    operation: RegistryOperation,
    aws_code: Option<String>,
    message: String,
}

impl RegistryError {
    pub fn new(
        operation: RegistryOperation,
        aws_code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            aws_code,
            message: message.into(),
        }
    }

    fn from_sdk<E>(operation: RegistryOperation, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let message = err
            .message()
            .map(str::to_owned)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        Self::new(operation, err.code().map(str::to_owned), message)
    }

    pub fn operation(&self) -> RegistryOperation {
        self.operation
    }

    /// Error code reported by AWS (`ResourceAlreadyExistsException`, ...), if any.
    pub fn aws_code(&self) -> Option<&str> {
        self.aws_code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Raw result of `CreateKeysAndCertificate`. The registry may omit any field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeysAndCertificate {
    pub certificate_arn: Option<String>,
    pub certificate_id: Option<String>,
    pub certificate_pem: Option<String>,
    pub key_pair: Option<RawKeyPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawKeyPair {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

/// The four registry operations issuance depends on. None of them are idempotent.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn create_thing(&self, thing_name: &str) -> Result<(), RegistryError>;

    async fn create_keys_and_certificate(
        &self,
        set_as_active: bool,
    ) -> Result<KeysAndCertificate, RegistryError>;

    async fn attach_policy(&self, policy_name: &str, target: &str) -> Result<(), RegistryError>;

    async fn attach_thing_principal(
        &self,
        thing_name: &str,
        principal: &str,
    ) -> Result<(), RegistryError>;
}

/// [`DeviceRegistry`] backed by the AWS IoT Core control plane.
#[derive(Clone)]
pub struct IotRegistry {
    client: Client,
}

impl IotRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceRegistry for IotRegistry {
    async fn create_thing(&self, thing_name: &str) -> Result<(), RegistryError> {
        self.client
            .create_thing()
            .thing_name(thing_name)
            .send()
            .await
            .map_err(|e| RegistryError::from_sdk(RegistryOperation::CreateThing, e))?;
        Ok(())
    }

    async fn create_keys_and_certificate(
        &self,
        set_as_active: bool,
    ) -> Result<KeysAndCertificate, RegistryError> {
        let output = self
            .client
            .create_keys_and_certificate()
            .set_as_active(set_as_active)
            .send()
            .await
            .map_err(|e| {
                RegistryError::from_sdk(RegistryOperation::CreateKeysAndCertificate, e)
            })?;

        Ok(KeysAndCertificate {
            certificate_arn: output.certificate_arn().map(str::to_owned),
            certificate_id: output.certificate_id().map(str::to_owned),
            certificate_pem: output.certificate_pem().map(str::to_owned),
            key_pair: output.key_pair().map(|pair| RawKeyPair {
                public_key: pair.public_key().map(str::to_owned),
                private_key: pair.private_key().map(str::to_owned),
            }),
        })
    }

    async fn attach_policy(&self, policy_name: &str, target: &str) -> Result<(), RegistryError> {
        self.client
            .attach_policy()
            .policy_name(policy_name)
            .target(target)
            .send()
            .await
            .map_err(|e| RegistryError::from_sdk(RegistryOperation::AttachPolicy, e))?;
        Ok(())
    }

    async fn attach_thing_principal(
        &self,
        thing_name: &str,
        principal: &str,
    ) -> Result<(), RegistryError> {
        self.client
            .attach_thing_principal()
            .thing_name(thing_name)
            .principal(principal)
            .send()
            .await
            .map_err(|e| {
                RegistryError::from_sdk(RegistryOperation::AttachThingPrincipal, e)
            })?;
        Ok(())
    }
}
