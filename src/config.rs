use std::{env, fmt};

use thiserror::Error;

const REGION_ENV: &str = "region";
const ACCOUNT_ID_ENV: &str = "accountId";
const STAGE_ENV: &str = "stage";
const POLICY_NAME_ENV: &str = "policyName";
const RUNTIME_REGION_ENVS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Stage name that marks the production deployment.
pub const PRODUCTION_STAGE: &str = "prd";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0} env var")]
    Missing(&'static str),
    #[error("missing region: set `region`, AWS_REGION or AWS_DEFAULT_REGION")]
    MissingRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    ExplicitVar,
    AwsRuntime,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::ExplicitVar => write!(f, "explicit region"),
            ResolutionSource::AwsRuntime => write!(f, "AWS runtime auto-detect"),
        }
    }
}

/// Deployment stage (`dev`, `stg`, `prd`, ...). Only affects thing naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage(String);

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION_STAGE
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings the issuance function needs, resolved once per cold start.
///
/// The region is taken from:
///  1. the explicit `region` variable set by the deployment
///  2. the AWS runtime variables (`AWS_REGION`, `AWS_DEFAULT_REGION`)
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    region: String,
    region_source: ResolutionSource,
    account_id: String,
    stage: Stage,
    policy_name: String,
}

impl IssuerConfig {
    pub fn new(
        region: impl Into<String>,
        account_id: impl Into<String>,
        stage: Stage,
        policy_name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            region_source: ResolutionSource::ExplicitVar,
            account_id: account_id.into(),
            stage,
            policy_name: policy_name.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let (region, region_source) = Self::detect_region()?;
        Ok(Self {
            region,
            region_source,
            account_id: required(ACCOUNT_ID_ENV)?,
            stage: Stage::new(required(STAGE_ENV)?),
            policy_name: required(POLICY_NAME_ENV)?,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn region_source(&self) -> ResolutionSource {
        self.region_source
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// IoT policy attached to every issued certificate.
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// ARN of a thing in this account and region.
    pub fn thing_arn(&self, thing_name: &str) -> String {
        format!(
            "arn:aws:iot:{}:{}:thing/{}",
            self.region, self.account_id, thing_name
        )
    }

    fn detect_region() -> Result<(String, ResolutionSource), ConfigError> {
        if let Some(explicit) = non_empty(REGION_ENV) {
            return Ok((explicit, ResolutionSource::ExplicitVar));
        }
        RUNTIME_REGION_ENVS
            .iter()
            .find_map(|key| non_empty(key))
            .map(|region| (region, ResolutionSource::AwsRuntime))
            .ok_or(ConfigError::MissingRegion)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    non_empty(key).ok_or(ConfigError::Missing(key))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}
