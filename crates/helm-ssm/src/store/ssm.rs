//! AWS Systems Manager Parameter Store backend
use super::{Parameter, ParameterStore, StoreError};
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::DisplayErrorContext;

/// Where to find AWS credentials and which region to talk to
///
/// Unset fields fall back to the default AWS provider chain (environment, shared config, ...).
#[derive(Debug, Clone, Default, derive_new::new)]
pub struct SsmSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// Blocking [ParameterStore] on top of the async AWS SDK
///
/// Owns a single threaded runtime, every call blocks until AWS responded.
pub struct SsmParameterStore {
    runtime: tokio::runtime::Runtime,
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn connect(settings: &SsmSettings) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreError::Connect)?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }

        let config = runtime.block_on(loader.load());
        tracing::info!(region = ?config.region(), "connected to parameter store");

        Ok(Self {
            client: aws_sdk_ssm::Client::new(&config),
            runtime,
        })
    }
}

impl ParameterStore for SsmParameterStore {
    #[tracing::instrument(level = "debug", skip(self))]
    fn get_parameter(&self, name: &str) -> Result<String, StoreError> {
        let request = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send();

        let output = self.runtime.block_on(request).map_err(|err| {
            let not_found = err
                .as_service_error()
                .is_some_and(|service_error| service_error.is_parameter_not_found());
            if not_found {
                StoreError::NotFound(name.to_string())
            } else {
                StoreError::Request(DisplayErrorContext(&err).to_string())
            }
        })?;

        output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(ToString::to_string)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn get_parameters_by_path(&self, path: &str) -> Result<Vec<Parameter>, StoreError> {
        self.runtime.block_on(async {
            let mut pages = self
                .client
                .get_parameters_by_path()
                .path(path)
                .recursive(true)
                .with_decryption(true)
                .into_paginator()
                .send();

            let mut parameters = vec![];
            while let Some(page) = pages.next().await {
                let page =
                    page.map_err(|err| StoreError::Request(DisplayErrorContext(&err).to_string()))?;

                for parameter in page.parameters() {
                    let (Some(name), Some(value)) = (parameter.name(), parameter.value()) else {
                        tracing::warn!(name = ?parameter.name(), "skipping parameter without name or value");
                        continue;
                    };

                    parameters.push(Parameter {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
            }

            tracing::debug!(count = parameters.len(), "fetched parameters");
            Ok(parameters)
        })
    }
}
