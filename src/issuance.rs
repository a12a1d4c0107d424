//! Certificate issuance pipeline.
//!
//! Four registry calls run strictly in order: create the thing, create an
//! active certificate, attach the access policy, attach the certificate to the
//! thing. The first failure ends the run. Nothing created before the failure
//! is deleted; the returned [`IssuanceFailure`] lists what was left behind.

use std::fmt;

use tracing::{debug, info};

use crate::{
    certificate::{thing_name, CertificateBundle},
    config::IssuerConfig,
    error::AppError,
    registry::DeviceRegistry,
};

/// Progress through the pipeline. Each step can only advance to the next one or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssuanceStep {
    Started,
    ThingCreated,
    CertificateIssued,
    PolicyAttached,
    PrincipalAttached,
}

impl fmt::Display for IssuanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStep::Started => "started",
            IssuanceStep::ThingCreated => "thing-created",
            IssuanceStep::CertificateIssued => "certificate-issued",
            IssuanceStep::PolicyAttached => "policy-attached",
            IssuanceStep::PrincipalAttached => "principal-attached",
        };
        f.write_str(name)
    }
}

/// A registry resource created before the pipeline failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeftoverResource {
    Thing { name: String, arn: String },
    Certificate { id: String, arn: String },
}

impl fmt::Display for LeftoverResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeftoverResource::Thing { arn, .. } => write!(f, "thing {arn}"),
            LeftoverResource::Certificate { arn, .. } => write!(f, "certificate {arn}"),
        }
    }
}

/// Why a run stopped, how far it got, and what it left in the registry.
#[derive(Debug)]
pub struct IssuanceFailure {
    pub thing_name: String,
    pub reached: IssuanceStep,
    pub leftovers: Vec<LeftoverResource>,
    pub error: AppError,
}

struct Run<'a> {
    config: &'a IssuerConfig,
    thing_name: String,
    reached: IssuanceStep,
    leftovers: Vec<LeftoverResource>,
}

impl Run<'_> {
    fn advance(&mut self, step: IssuanceStep) {
        debug!(
            thing_name = %self.thing_name,
            from = %self.reached,
            to = %step,
            "issuance step completed"
        );
        self.reached = step;
    }

    fn fail(self, error: impl Into<AppError>) -> IssuanceFailure {
        IssuanceFailure {
            thing_name: self.thing_name,
            reached: self.reached,
            leftovers: self.leftovers,
            error: error.into(),
        }
    }

    fn thing_created(&mut self) {
        self.leftovers.push(LeftoverResource::Thing {
            name: self.thing_name.clone(),
            arn: self.config.thing_arn(&self.thing_name),
        });
        self.advance(IssuanceStep::ThingCreated);
    }
}

/// Register `device_id` and issue it an active certificate bound to the configured policy.
pub async fn issue_certificate(
    registry: &dyn DeviceRegistry,
    config: &IssuerConfig,
    device_id: &str,
) -> Result<CertificateBundle, IssuanceFailure> {
    let mut run = Run {
        config,
        thing_name: thing_name(device_id, config.stage()),
        reached: IssuanceStep::Started,
        leftovers: Vec::new(),
    };

    if let Err(e) = registry.create_thing(&run.thing_name).await {
        return Err(run.fail(e));
    }
    run.thing_created();

    let raw = match registry.create_keys_and_certificate(true).await {
        Ok(raw) => raw,
        Err(e) => return Err(run.fail(e)),
    };
    if let (Some(id), Some(arn)) = (&raw.certificate_id, &raw.certificate_arn) {
        run.leftovers.push(LeftoverResource::Certificate {
            id: id.clone(),
            arn: arn.clone(),
        });
    }
    let bundle = match CertificateBundle::try_from(raw) {
        Ok(bundle) => bundle,
        Err(e) => return Err(run.fail(e)),
    };
    run.advance(IssuanceStep::CertificateIssued);

    if let Err(e) = registry
        .attach_policy(config.policy_name(), &bundle.certificate_arn)
        .await
    {
        return Err(run.fail(e));
    }
    run.advance(IssuanceStep::PolicyAttached);

    if let Err(e) = registry
        .attach_thing_principal(&run.thing_name, &bundle.certificate_arn)
        .await
    {
        return Err(run.fail(e));
    }
    run.advance(IssuanceStep::PrincipalAttached);

    info!(
        thing_name = %run.thing_name,
        certificate_id = %bundle.certificate_id,
        policy_name = config.policy_name(),
        "certificate issued"
    );
    Ok(bundle)
}
