//! Genesis key-set generation.
//!
//! Mints the keys a new network needs at genesis, grouped by role. With a
//! base key every key is derived deterministically as `{base}///{Role}/{i}`;
//! without one each key is freshly generated.
//!
//! Two documents come out of a run: the public key set (`generated_keys.json`)
//! and the matching secrets (`secrets.json`). Secrets derived from the base key
//! are stored without the base key prefix, and the base key is stored once.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::keys::{KeyGenError, KeyGenerator, KeyRecord, KeyScheme, NodeKey};

/// File name of the secrets document inside the secrets folder.
pub const SECRETS_FILE: &str = "secrets.json";

/// Role of a genesis account. Determines the derivation path component and
/// the section the key lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Validator,
    ValidatorAccount,
    Nominator,
    CommunityCustodian,
    Foundation,
    ContributorCustodian,
    Investor,
    Sudo,
}

impl Role {
    /// Path component used in `{base}///{Role}/{i}`.
    pub fn path_component(&self) -> &'static str {
        match self {
            Role::Validator => "Validator",
            Role::ValidatorAccount => "ValidatorAccount",
            Role::Nominator => "Nominator",
            Role::CommunityCustodian => "CommunityCustodian",
            Role::Foundation => "Foundation",
            Role::ContributorCustodian => "ContributorCustodian",
            Role::Investor => "Investor",
            Role::Sudo => "Sudo",
        }
    }
}

/// How many keys of each role to mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySetSpec {
    pub validators: usize,
    pub nominators: usize,
    pub community_custodians: usize,
    pub foundations: usize,
    pub contributor_custodians: usize,
    pub investors: usize,

    /// Mint a single sudo key
    pub sudo: bool,

    /// Give each validator a stash account distinct from its session keys
    pub separate_validator_account: bool,

    /// Root of the derivation paths; `None` generates random keys
    pub base_key: Option<String>,
}

impl Default for KeySetSpec {
    fn default() -> Self {
        Self {
            validators: 10,
            nominators: 10,
            community_custodians: 3,
            foundations: 2,
            contributor_custodians: 2,
            investors: 2,
            sudo: true,
            separate_validator_account: false,
            base_key: None,
        }
    }
}

impl KeySetSpec {
    fn derived_uri(&self, role: Role, index: usize) -> Option<String> {
        self.base_key
            .as_ref()
            .map(|base| format!("{}///{}/{}", base, role.path_component(), index))
    }

    /// Strip the base key from a derived URI.
    fn sanitize(&self, uri: &str) -> String {
        match &self.base_key {
            Some(base) => uri
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(str::to_string)
                .unwrap_or_else(|| uri.to_string()),
            None => uri.to_string(),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorKeys {
    pub account_public_key: String,
    pub sr25519_public_key: String,
    pub ed25519_public_key: String,
    pub peer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountKeys {
    pub sr25519_public_key: String,
}

/// Public half of a key set, in role order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenesisKeys {
    pub validators: Vec<ValidatorKeys>,
    pub nominators: Vec<AccountKeys>,
    pub community_custodians: Vec<AccountKeys>,
    pub foundations: Vec<AccountKeys>,
    pub contributor_custodians: Vec<AccountKeys>,
    pub investors: Vec<AccountKeys>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo: Option<AccountKeys>,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorSecrets {
    pub account: String,
    pub secret_phrase: String,
    pub node_key_file: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AccountSecret {
    pub secret_phrase: String,
}

/// Secret half of a key set.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct GenesisSecrets {
    pub validators: Vec<ValidatorSecrets>,
    pub nominators: Vec<AccountSecret>,
    pub community_custodians: Vec<AccountSecret>,
    pub foundations: Vec<AccountSecret>,
    pub contributor_custodians: Vec<AccountSecret>,
    pub investors: Vec<AccountSecret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo: Option<AccountSecret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_key: Option<String>,
}

impl std::fmt::Debug for GenesisSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenesisSecrets")
            .field("validators", &self.validators.len())
            .field("nominators", &self.nominators.len())
            .finish_non_exhaustive()
    }
}

/// A complete key set, ready to be written out.
#[derive(Debug, Clone)]
pub struct KeySet {
    pub keys: GenesisKeys,
    pub secrets: GenesisSecrets,

    /// Validator node keys with the file each one belongs in
    pub node_keys: Vec<(PathBuf, NodeKey)>,
}

impl KeySet {
    /// Write node key files, the public key document and the secrets
    /// document. The secrets folder is created if needed.
    pub fn write(&self, keys_path: &Path, secrets_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(secrets_dir)?;

        for (path, key) in &self.node_keys {
            std::fs::write(path, &key.secret)?;
        }
        write_pretty(keys_path, &self.keys)?;
        write_pretty(&secrets_dir.join(SECRETS_FILE), &self.secrets)?;

        tracing::info!(
            "Wrote {} and {}",
            keys_path.display(),
            secrets_dir.join(SECRETS_FILE).display()
        );
        Ok(())
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)
}

// ============================================================================
// Generation
// ============================================================================

impl KeyGenerator {
    /// Mint every key a genesis configuration needs.
    ///
    /// Each validator gets an sr25519 and an ed25519 key over one secret, a
    /// stash account (the sr25519 key itself unless
    /// `separate_validator_account` is set) and a node key whose file lives
    /// in `secrets_dir`. Nothing is written to disk here.
    pub async fn generate_key_set(
        &self,
        spec: &KeySetSpec,
        secrets_dir: &Path,
    ) -> Result<KeySet, KeyGenError> {
        let mut validators = Vec::with_capacity(spec.validators);
        let mut validator_secrets = Vec::with_capacity(spec.validators);
        let mut node_keys = Vec::with_capacity(spec.validators);

        for index in 0..spec.validators {
            let (sr25519, secret_phrase) = self.role_key(spec, Role::Validator, index).await?;
            let ed25519 = self.inspect(&secret_phrase, KeyScheme::Ed25519).await?;

            let (account, account_phrase) = if spec.separate_validator_account {
                self.role_key(spec, Role::ValidatorAccount, index).await?
            } else {
                (sr25519.clone(), secret_phrase.clone())
            };

            let node_key = self.generate_node_key().await?;
            let node_key_file = secrets_dir.join(format!("validator_node_key_{}", index));

            validators.push(ValidatorKeys {
                account_public_key: account.ss58_public_key,
                sr25519_public_key: sr25519.ss58_public_key,
                ed25519_public_key: ed25519.ss58_public_key,
                peer_id: node_key.peer_id.clone(),
            });
            validator_secrets.push(ValidatorSecrets {
                account: spec.sanitize(&account_phrase),
                secret_phrase: spec.sanitize(&secret_phrase),
                node_key_file: node_key_file.display().to_string(),
            });
            node_keys.push((node_key_file, node_key));
        }
        tracing::info!("Generated {} validator key sets", spec.validators);

        let (nominators, nominator_secrets) =
            self.role_keys(spec, Role::Nominator, spec.nominators).await?;
        let (community_custodians, community_custodian_secrets) = self
            .role_keys(spec, Role::CommunityCustodian, spec.community_custodians)
            .await?;
        let (foundations, foundation_secrets) =
            self.role_keys(spec, Role::Foundation, spec.foundations).await?;
        let (contributor_custodians, contributor_custodian_secrets) = self
            .role_keys(spec, Role::ContributorCustodian, spec.contributor_custodians)
            .await?;
        let (investors, investor_secrets) =
            self.role_keys(spec, Role::Investor, spec.investors).await?;

        let (sudo, sudo_secret) = if spec.sudo {
            let (mut keys, mut secrets) = self.role_keys(spec, Role::Sudo, 1).await?;
            (keys.pop(), secrets.pop())
        } else {
            (None, None)
        };

        Ok(KeySet {
            keys: GenesisKeys {
                validators,
                nominators,
                community_custodians,
                foundations,
                contributor_custodians,
                investors,
                sudo,
            },
            secrets: GenesisSecrets {
                validators: validator_secrets,
                nominators: nominator_secrets,
                community_custodians: community_custodian_secrets,
                foundations: foundation_secrets,
                contributor_custodians: contributor_custodian_secrets,
                investors: investor_secrets,
                sudo: sudo_secret,
                base_key: spec.base_key.clone(),
            },
            node_keys,
        })
    }

    /// sr25519 keys for `count` accounts of one role.
    async fn role_keys(
        &self,
        spec: &KeySetSpec,
        role: Role,
        count: usize,
    ) -> Result<(Vec<AccountKeys>, Vec<AccountSecret>), KeyGenError> {
        let mut keys = Vec::with_capacity(count);
        let mut secrets = Vec::with_capacity(count);

        for index in 0..count {
            let (record, secret_phrase) = self.role_key(spec, role, index).await?;
            keys.push(AccountKeys {
                sr25519_public_key: record.ss58_public_key,
            });
            secrets.push(AccountSecret {
                secret_phrase: spec.sanitize(&secret_phrase),
            });
        }

        tracing::debug!("Generated {} {} keys", count, role.path_component());
        Ok((keys, secrets))
    }

    /// One sr25519 key and the secret it was made from: derived from the
    /// base key when there is one, random otherwise.
    async fn role_key(
        &self,
        spec: &KeySetSpec,
        role: Role,
        index: usize,
    ) -> Result<(KeyRecord, String), KeyGenError> {
        match spec.derived_uri(role, index) {
            Some(uri) => {
                let record = self.inspect(&uri, KeyScheme::Sr25519).await?;
                Ok((record, uri))
            }
            None => {
                let record = self.generate(KeyScheme::Sr25519).await?;
                let phrase = record.secret_phrase.clone().ok_or_else(|| {
                    KeyGenError::MalformedOutput("generated key has no secret phrase".to_string())
                })?;
                Ok((record, phrase))
            }
        }
    }
}
