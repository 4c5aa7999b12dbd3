use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::rewrite::USER_LABEL;

pub const SYSTEM_FAILED: &str = "systemd_system_failed";
pub const USER_FAILED: &str = "systemd_user_failed";

/// Outcome of one scrape, rendered as failure-indicator families.
///
/// ## Metrics
/// - `systemd_system_failed` - 1 if the host-wide fetch failed, else 0
/// - `systemd_user_failed{user}` - 1 if the session fetch failed, else 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    pub system_failed: bool,
    /// `(identity, failed)` per session, in enumeration order.
    pub users: Vec<(String, bool)>,
}

impl FailureReport {
    /// Number of failed sources, host-wide included.
    pub fn failures(&self) -> usize {
        usize::from(self.system_failed) + self.users.iter().filter(|(_, failed)| *failed).count()
    }

    /// Encodes the report in text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let registry = Registry::new();

        let system = IntGauge::new(SYSTEM_FAILED, "Whether fetching the system exporter failed")?;
        registry.register(Box::new(system.clone()))?;
        system.set(i64::from(self.system_failed));

        let users = IntGaugeVec::new(
            Opts::new(USER_FAILED, "Whether fetching a user exporter failed"),
            &[USER_LABEL],
        )?;
        registry.register(Box::new(users.clone()))?;
        for (identity, failed) in &self.users {
            users
                .with_label_values(&[identity.as_str()])
                .set(i64::from(*failed));
        }

        let mut buf = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
