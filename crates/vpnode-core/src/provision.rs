//! Provisioning orchestration: portal fetch → synthesis → file sink.
//!
//! [`Provisioner`] is the facade the CLI drives. Apart from the portal
//! round trips and the sink writes, everything below it is pure; a run
//! consumes one snapshot of the profile list and produces output
//! deterministically from it. Failures abort the run with no cleanup of
//! already-written files: deployments are replaced wholesale, not patched.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};

use vpnode_api::PortalClient;

use crate::error::CoreError;
use crate::firewall::{self, InetFamily};
use crate::model::{FirewallPolicy, ProfileDefinition, TlsProtection};
use crate::openvpn::{self, SynthesizerSettings};
use crate::sink;

/// Facade tying the portal client to the synthesis engine.
pub struct Provisioner {
    client: PortalClient,
    config_dir: PathBuf,
    settings: SynthesizerSettings,
}

/// What a provisioning run produced, for reporting.
#[derive(Debug, Default)]
pub struct ProvisionSummary {
    /// Profile ids written, in synthesis order.
    pub profiles: Vec<String>,
    /// Server config files written (excludes key material).
    pub files_written: usize,
}

/// Rendered iptables/ip6tables restore documents.
#[derive(Debug)]
pub struct FirewallDocuments {
    pub v4: String,
    pub v6: String,
}

impl Provisioner {
    pub fn new(client: PortalClient, config_dir: PathBuf, settings: SynthesizerSettings) -> Self {
        Self {
            client,
            config_dir,
            settings,
        }
    }

    /// Fetch the profile list, injecting ids from the map keys.
    ///
    /// Profiles come back ordered by id so every downstream artifact is
    /// deterministic for one portal snapshot.
    pub async fn fetch_profiles(&self) -> Result<Vec<ProfileDefinition>, CoreError> {
        let listing = self.client.profile_list::<ProfileDefinition>().await?;
        debug!(profiles = listing.len(), "fetched profile list");
        Ok(listing
            .into_iter()
            .map(|(id, mut profile)| {
                profile.profile_id = id;
                profile
            })
            .collect())
    }

    /// Write server configs and key material for every profile (or one,
    /// with `only`).
    pub async fn write_profiles(&self, only: Option<&str>) -> Result<ProvisionSummary, CoreError> {
        let profiles = self.fetch_profiles().await?;
        if let Some(id) = only {
            if !profiles.iter().any(|p| p.profile_id == id) {
                return Err(CoreError::ProfileNotFound { id: id.to_owned() });
            }
        }

        sink::create_dir(&self.config_dir)?;

        let mut summary = ProvisionSummary::default();
        for profile in profiles
            .iter()
            .filter(|p| only.is_none_or(|id| id == p.profile_id))
        {
            info!(profile = %profile.profile_id, "writing server configs");
            for file in openvpn::synthesize(profile, &self.settings)? {
                sink::write_file(&self.config_dir.join(&file.name), &file.contents)?;
                summary.files_written += 1;
            }

            self.issue_certificates(profile).await?;
            summary.profiles.push(profile.profile_id.clone());
        }
        Ok(summary)
    }

    /// One certificate request per profile, keyed by a fresh
    /// `YYYYMMDDHHMMSS.{profileId}` common name, with the returned PEM
    /// artifacts written under `tls/{profileId}/`.
    async fn issue_certificates(&self, profile: &ProfileDefinition) -> Result<(), CoreError> {
        let tls_dir = self.config_dir.join("tls").join(&profile.profile_id);
        sink::create_dir(&tls_dir)?;

        let common_name = format!(
            "{}.{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            profile.profile_id
        );
        info!(profile = %profile.profile_id, %common_name, "requesting server certificate");
        let bundle = self.client.add_server_certificate(&common_name).await?;

        let tls_key_name = match profile.tls_protection {
            TlsProtection::TlsCrypt => "tls-crypt.key",
            TlsProtection::TlsAuth => "ta.key",
        };
        for (name, contents) in [
            ("ca.crt", &bundle.ca),
            ("server.crt", &bundle.certificate),
            ("server.key", &bundle.private_key),
            (tls_key_name, &bundle.tls_crypt),
        ] {
            sink::write_file(&tls_dir.join(name), contents)?;
        }
        Ok(())
    }

    /// Render both firewall documents from the current profile list.
    pub async fn firewall_documents(
        &self,
        policy: &FirewallPolicy,
    ) -> Result<FirewallDocuments, CoreError> {
        let profiles = self.fetch_profiles().await?;
        Ok(FirewallDocuments {
            v4: firewall::document(&profiles, policy, InetFamily::V4)?,
            v6: firewall::document(&profiles, policy, InetFamily::V6)?,
        })
    }
}
