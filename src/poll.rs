//! Polling for externally assigned service addresses

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::ingress::{parse_json_output, parse_template_output, IngressStatus};
use crate::kubectl::{IngressFormat, Kubectl};
use crate::{Error, Result};

/// Delay between ingress queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often to poll and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Result type for polling check functions.
///
/// - `Ok(Some(value))` - Condition met, return the value
/// - `Ok(None)` - Condition not met yet, keep polling
/// - `Err(e)` - Fatal error, stop polling immediately
pub type PollResult<T> = Result<Option<T>>;

/// Call `check_fn` until it yields a value, sleeping `policy.interval` between
/// attempts.
///
/// The first check happens immediately. Errors from `check_fn` abort the loop
/// unchanged; exceeding `policy.max_wait` returns [`Error::PollTimeout`].
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    description: &str,
    mut check_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollResult<T>>,
{
    let start = Instant::now();

    loop {
        if let Some(value) = check_fn().await? {
            return Ok(value);
        }

        if let Some(max_wait) = policy.max_wait {
            let waited = start.elapsed();
            if waited >= max_wait {
                return Err(Error::PollTimeout {
                    description: description.to_string(),
                    waited,
                });
            }
        }

        debug!("Waiting for {}...", description);
        tokio::time::sleep(policy.interval).await;
    }
}

/// Resolves service ingress addresses through kubectl
pub struct AddressPoller<'a, K: Kubectl + ?Sized> {
    kubectl: &'a K,
    policy: PollPolicy,
    format: IngressFormat,
}

impl<'a, K: Kubectl + ?Sized> AddressPoller<'a, K> {
    pub fn new(kubectl: &'a K, policy: PollPolicy, format: IngressFormat) -> Self {
        Self {
            kubectl,
            policy,
            format,
        }
    }

    /// Block until `service` in `namespace` has an ingress address
    pub async fn resolve(&self, service: &str, namespace: &str) -> Result<String> {
        let description = format!("{} ingress address", service);
        let address = poll_until(self.policy, &description, || async {
            let output = self
                .kubectl
                .service_ingress(service, namespace, self.format)
                .await?;
            let status = match self.format {
                IngressFormat::Template => parse_template_output(&output),
                IngressFormat::Json => parse_json_output(&output),
            };
            match status {
                IngressStatus::Assigned(address) => Ok(Some(address)),
                IngressStatus::Pending => Ok(None),
                IngressStatus::Unrecognized => Err(Error::UnexpectedOutput {
                    service: service.to_string(),
                    output,
                }),
            }
        })
        .await?;

        info!(service = %service, address = %address, "Ingress address assigned");
        Ok(address)
    }
}
