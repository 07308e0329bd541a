//! Built-in secret signature table
//!
//! Each signature pairs a regex with the metadata needed to score and explain
//! a finding. Patterns that anchor on an assignment keyword (`api_key = ...`)
//! carry a capture group so the screened value is the secret itself rather
//! than the surrounding syntax.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use super::Severity;

/// How a signature confirms that a raw regex hit is a real secret.
///
/// Custom variants are authoritative: when present, their verdict replaces
/// the generic placeholder/length screening entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// No custom logic; the generic false-positive screen applies.
    Generic,
    /// The value must contain both letters and digits.
    MixedClasses,
    /// The pattern's shape alone is proof (PEM armor and similar); bypasses
    /// the placeholder denylist, which would otherwise trip on words like
    /// "key" inside the matched text.
    AlwaysConfirm,
    /// Never confirms. Used where the bare pattern produces too many false
    /// positives to flag without surrounding context we do not yet gather.
    NeverConfirm,
}

impl Validator {
    pub fn is_custom(self) -> bool {
        self != Validator::Generic
    }

    /// Verdict for custom validators. Callers must not invoke this for
    /// `Generic`; the generic screen lives in the detector.
    pub fn confirm(self, value: &str) -> bool {
        match self {
            Validator::Generic => true,
            Validator::MixedClasses => {
                value.chars().any(|c| c.is_ascii_alphabetic())
                    && value.chars().any(|c| c.is_ascii_digit())
            }
            Validator::AlwaysConfirm => true,
            Validator::NeverConfirm => false,
        }
    }
}

/// A named secret pattern plus its scoring metadata.
#[derive(Debug, Clone)]
pub struct SecretSignature {
    /// Unique identifier, e.g. `aws_access_key_id`.
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub regex: Regex,
    /// Matches shorter than this are rejected by the generic screen.
    pub min_length: Option<usize>,
    pub validator: Validator,
    pub recommendation: &'static str,
}

struct Entry {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    severity: Severity,
    pattern: &'static str,
    min_length: Option<usize>,
    validator: Validator,
    recommendation: &'static str,
}

impl SecretSignature {
    fn build(entry: Entry) -> Result<Self> {
        let regex = RegexBuilder::new(entry.pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid regex for signature {}: {}", entry.name, entry.pattern))?;
        Ok(Self {
            name: entry.name,
            category: entry.category,
            description: entry.description,
            severity: entry.severity,
            regex,
            min_length: entry.min_length,
            validator: entry.validator,
            recommendation: entry.recommendation,
        })
    }
}

/// Build the full signature table.
///
/// Order matters: service-specific signatures come before the generic
/// assignment-anchored ones, so that overlapping matches resolve in favor of
/// the more precise detection type.
pub fn builtin_signatures() -> Result<Vec<SecretSignature>> {
    let entries = vec![
        // --- Cloud providers ---
        Entry {
            name: "aws_access_key_id",
            category: "cloud",
            description: "AWS access key ID",
            severity: Severity::Critical,
            pattern: r"\b(?:A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[A-Z0-9]{16}\b",
            min_length: Some(20),
            validator: Validator::Generic,
            recommendation: "Rotate the key in IAM immediately and audit CloudTrail for misuse",
        },
        Entry {
            name: "aws_secret_access_key",
            category: "cloud",
            description: "AWS secret access key",
            severity: Severity::Critical,
            pattern: r#"aws[a-z0-9_ .\-]{0,25}(?:secret|access)[a-z0-9_ .\-]{0,25}[:=]\s*["']?([A-Za-z0-9/+=]{40})["']?"#,
            min_length: Some(40),
            validator: Validator::MixedClasses,
            recommendation: "Rotate the secret key in IAM and move credentials to a secret manager",
        },
        Entry {
            name: "aws_mws_auth_token",
            category: "cloud",
            description: "Amazon MWS auth token",
            severity: Severity::High,
            pattern: r"amzn\.mws\.[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
            min_length: None,
            validator: Validator::Generic,
            recommendation: "Revoke the MWS token in Seller Central",
        },
        Entry {
            name: "gcp_api_key",
            category: "cloud",
            description: "Google Cloud Platform API key",
            severity: Severity::High,
            pattern: r"\bAIzaSy[0-9A-Za-z_\-]{33}\b",
            min_length: Some(39),
            validator: Validator::Generic,
            recommendation: "Regenerate the key in the GCP console and add API restrictions",
        },
        Entry {
            name: "gcp_oauth_client_id",
            category: "cloud",
            description: "Google OAuth client ID",
            severity: Severity::Medium,
            pattern: r"\b[0-9]+-[0-9a-z_]{24,}\.apps\.googleusercontent\.com\b",
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Client IDs are semi-public; verify the matching secret is not nearby",
        },
        Entry {
            name: "gcp_service_account",
            category: "cloud",
            description: "GCP service account credentials file",
            severity: Severity::Critical,
            pattern: r#""type"\s*:\s*"service_account""#,
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Delete the service account key and issue a new one with least privilege",
        },
        Entry {
            name: "azure_storage_key",
            category: "cloud",
            description: "Azure storage account key",
            severity: Severity::Critical,
            pattern: r"AccountKey=([A-Za-z0-9+/=]{88})",
            min_length: Some(88),
            validator: Validator::Generic,
            recommendation: "Regenerate the storage account key in the Azure portal",
        },
        Entry {
            name: "heroku_api_key",
            category: "cloud",
            description: "Heroku API key",
            severity: Severity::High,
            // A bare UUID near the word "heroku" matches far too much real
            // code (build metadata, addon ids). Until the detector can weigh
            // surrounding context this signature never confirms.
            pattern: r"heroku[a-z0-9_ .,<>\-]{0,25}\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b",
            min_length: None,
            validator: Validator::NeverConfirm,
            recommendation: "Rotate the key with `heroku authorizations` and revoke the old one",
        },
        Entry {
            name: "firebase_database_url",
            category: "cloud",
            description: "Firebase realtime database URL",
            severity: Severity::Medium,
            pattern: r"https://[a-z0-9\-]+\.firebaseio\.com",
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Review Firebase security rules; the URL alone may expose open data",
        },
        // --- Version control ---
        Entry {
            name: "github_token",
            category: "vcs",
            description: "GitHub personal access or app token",
            severity: Severity::Critical,
            pattern: r"\b(?:gh[oprsu]|github_pat)_[A-Za-z0-9_]{36,251}\b",
            min_length: Some(40),
            validator: Validator::Generic,
            recommendation: "Revoke the token in GitHub settings and create a fine-grained replacement",
        },
        Entry {
            name: "gitlab_token",
            category: "vcs",
            description: "GitLab personal access token",
            severity: Severity::Critical,
            pattern: r"\bglpat-[A-Za-z0-9_=\-]{20,22}\b",
            min_length: Some(26),
            validator: Validator::Generic,
            recommendation: "Revoke the token in GitLab user settings",
        },
        // --- Payment providers ---
        Entry {
            name: "stripe_api_key",
            category: "payment",
            description: "Stripe live secret or restricted key",
            severity: Severity::Critical,
            pattern: r"\b[rs]k_live_[0-9a-zA-Z]{24,99}\b",
            min_length: Some(30),
            validator: Validator::Generic,
            recommendation: "Roll the key in the Stripe dashboard; live keys grant full account access",
        },
        Entry {
            name: "stripe_publishable_key",
            category: "payment",
            description: "Stripe live publishable key",
            severity: Severity::Medium,
            pattern: r"\bpk_live_[0-9a-zA-Z]{24,99}\b",
            min_length: Some(30),
            validator: Validator::Generic,
            recommendation: "Publishable keys are lower risk but should not live in source control",
        },
        Entry {
            name: "square_access_token",
            category: "payment",
            description: "Square access token",
            severity: Severity::High,
            pattern: r"\bsq0atp-[0-9A-Za-z_\-]{22}\b",
            min_length: Some(29),
            validator: Validator::Generic,
            recommendation: "Revoke the token in the Square developer dashboard",
        },
        Entry {
            name: "square_oauth_secret",
            category: "payment",
            description: "Square OAuth secret",
            severity: Severity::High,
            pattern: r"\bsq0csp-[0-9A-Za-z_\-]{43}\b",
            min_length: Some(50),
            validator: Validator::Generic,
            recommendation: "Rotate the OAuth secret in the Square developer dashboard",
        },
        Entry {
            name: "paypal_braintree_token",
            category: "payment",
            description: "PayPal Braintree production access token",
            severity: Severity::Critical,
            pattern: r"access_token\$production\$[0-9a-z]{16}\$[0-9a-f]{32}",
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Revoke the token in the Braintree control panel",
        },
        Entry {
            name: "shopify_token",
            category: "payment",
            description: "Shopify access token",
            severity: Severity::Critical,
            pattern: r"\bshp(?:at|ca|pa|ss)_[a-fA-F0-9]{32}\b",
            min_length: Some(38),
            validator: Validator::Generic,
            recommendation: "Uninstall and reinstall the app, or rotate the token via the Partner dashboard",
        },
        // --- Communication platforms ---
        Entry {
            name: "slack_token",
            category: "communication",
            description: "Slack API token",
            severity: Severity::High,
            pattern: r"\bxox[baprs]-[0-9a-zA-Z\-]{10,72}\b",
            min_length: Some(15),
            validator: Validator::Generic,
            recommendation: "Revoke the token at api.slack.com and rotate the app credentials",
        },
        Entry {
            name: "slack_webhook",
            category: "communication",
            description: "Slack incoming webhook URL",
            severity: Severity::Medium,
            pattern: r"https://hooks\.slack\.com/services/T[A-Za-z0-9_]+/B[A-Za-z0-9_]+/[A-Za-z0-9_]+",
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Delete the webhook and create a new one; webhooks cannot be rotated",
        },
        Entry {
            name: "discord_bot_token",
            category: "communication",
            description: "Discord bot token",
            severity: Severity::High,
            pattern: r"\b[MNO][A-Za-z0-9_\-]{23}\.[A-Za-z0-9_\-]{6}\.[A-Za-z0-9_\-]{27}\b",
            min_length: Some(59),
            validator: Validator::Generic,
            recommendation: "Regenerate the bot token in the Discord developer portal",
        },
        Entry {
            name: "telegram_bot_token",
            category: "communication",
            description: "Telegram bot token",
            severity: Severity::High,
            pattern: r"\b[0-9]{8,10}:AA[A-Za-z0-9_\-]{33}\b",
            min_length: Some(44),
            validator: Validator::Generic,
            recommendation: "Revoke the token via @BotFather",
        },
        Entry {
            name: "twilio_api_key",
            category: "communication",
            description: "Twilio API key",
            severity: Severity::High,
            pattern: r"\bSK[0-9a-fA-F]{32}\b",
            min_length: Some(34),
            validator: Validator::Generic,
            recommendation: "Delete the API key in the Twilio console and create a replacement",
        },
        // --- Email providers ---
        Entry {
            name: "sendgrid_api_key",
            category: "email",
            description: "SendGrid API key",
            severity: Severity::Critical,
            pattern: r"\bSG\.[A-Za-z0-9_\-]{22}\.[A-Za-z0-9_\-]{43}\b",
            min_length: Some(69),
            validator: Validator::Generic,
            recommendation: "Delete the key in SendGrid settings and scope the replacement narrowly",
        },
        Entry {
            name: "mailgun_api_key",
            category: "email",
            description: "Mailgun API key",
            severity: Severity::High,
            pattern: r"\bkey-[0-9a-zA-Z]{32}\b",
            min_length: Some(36),
            validator: Validator::MixedClasses,
            recommendation: "Rotate the key in the Mailgun control panel",
        },
        Entry {
            name: "mailchimp_api_key",
            category: "email",
            description: "Mailchimp API key",
            severity: Severity::High,
            pattern: r"\b[0-9a-f]{32}-us[0-9]{1,2}\b",
            min_length: Some(36),
            validator: Validator::Generic,
            recommendation: "Disable the key under Account > Extras > API keys",
        },
        // --- Package registries ---
        Entry {
            name: "npm_access_token",
            category: "package_registry",
            description: "npm access token",
            severity: Severity::Critical,
            pattern: r"\bnpm_[A-Za-z0-9]{36}\b",
            min_length: Some(40),
            validator: Validator::Generic,
            recommendation: "Revoke the token with `npm token revoke` and enable 2FA for publishing",
        },
        Entry {
            name: "pypi_upload_token",
            category: "package_registry",
            description: "PyPI upload token",
            severity: Severity::Critical,
            pattern: r"pypi-AgEIcHlwaS5vcmc[A-Za-z0-9_\-]{50,}",
            min_length: Some(70),
            validator: Validator::Generic,
            recommendation: "Remove the token from your PyPI account and issue a project-scoped one",
        },
        // --- AI platforms ---
        Entry {
            name: "openai_api_key",
            category: "ai",
            description: "OpenAI API key",
            severity: Severity::Critical,
            pattern: r"\bsk-[A-Za-z0-9]{20}T3BlbkFJ[A-Za-z0-9]{20}\b",
            min_length: Some(51),
            validator: Validator::Generic,
            recommendation: "Revoke the key at platform.openai.com and set usage limits on the new one",
        },
        Entry {
            name: "anthropic_api_key",
            category: "ai",
            description: "Anthropic API key",
            severity: Severity::Critical,
            pattern: r"\bsk-ant-[A-Za-z0-9_\-]{32,}\b",
            min_length: Some(39),
            validator: Validator::Generic,
            recommendation: "Revoke the key in the Anthropic console",
        },
        Entry {
            name: "huggingface_token",
            category: "ai",
            description: "Hugging Face user access token",
            severity: Severity::High,
            pattern: r"\bhf_[A-Za-z0-9]{34,}\b",
            min_length: Some(37),
            validator: Validator::Generic,
            recommendation: "Invalidate the token in Hugging Face account settings",
        },
        // --- Cryptographic material ---
        Entry {
            name: "private_key",
            category: "crypto",
            description: "Private key block (PEM armor)",
            severity: Severity::Critical,
            pattern: r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP |ENCRYPTED )?PRIVATE KEY(?: BLOCK)?-----",
            min_length: None,
            validator: Validator::AlwaysConfirm,
            recommendation: "Treat the key as compromised: generate a new key pair and revoke the old",
        },
        Entry {
            name: "jwt_token",
            category: "crypto",
            description: "JSON Web Token",
            severity: Severity::Medium,
            pattern: r"\beyJ[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]{5,}\b",
            min_length: Some(30),
            validator: Validator::Generic,
            recommendation: "Invalidate the session and shorten token lifetimes",
        },
        // --- Database connection strings ---
        Entry {
            name: "postgres_url",
            category: "database",
            description: "PostgreSQL URL with embedded password",
            severity: Severity::High,
            pattern: r"postgres(?:ql)?://[^\s:@/]+:([^\s@/]{6,})@[^\s/]+",
            min_length: Some(6),
            validator: Validator::Generic,
            recommendation: "Change the database password and load it from the environment",
        },
        Entry {
            name: "mysql_url",
            category: "database",
            description: "MySQL URL with embedded password",
            severity: Severity::High,
            pattern: r"mysql://[^\s:@/]+:([^\s@/]{6,})@[^\s/]+",
            min_length: Some(6),
            validator: Validator::Generic,
            recommendation: "Change the database password and load it from the environment",
        },
        Entry {
            name: "mongodb_url",
            category: "database",
            description: "MongoDB URL with embedded password",
            severity: Severity::High,
            pattern: r"mongodb(?:\+srv)?://[^\s:@/]+:([^\s@/]{6,})@[^\s/]+",
            min_length: Some(6),
            validator: Validator::Generic,
            recommendation: "Rotate the database user credentials in Atlas or your cluster",
        },
        Entry {
            name: "redis_url",
            category: "database",
            description: "Redis URL with embedded password",
            severity: Severity::Medium,
            pattern: r"redis://[^\s:@/]*:([^\s@/]{6,})@[^\s/]+",
            min_length: Some(6),
            validator: Validator::Generic,
            recommendation: "Rotate the Redis AUTH password",
        },
        // --- Generic assignment-anchored patterns (kept last; see module docs) ---
        Entry {
            name: "basic_auth_url",
            category: "generic",
            description: "URL with basic-auth credentials",
            severity: Severity::Medium,
            pattern: r"[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s:@/]+:([^\s@/]{8,})@[^\s/]+",
            min_length: Some(8),
            validator: Validator::Generic,
            recommendation: "Remove credentials from the URL and authenticate via headers or config",
        },
        Entry {
            name: "generic_api_key",
            category: "generic",
            description: "Hard-coded API key assignment",
            severity: Severity::High,
            pattern: r#"(?:api[_\-]?key|apikey)["']?\s*[:=]\s*["']([A-Za-z0-9_\-]{16,64})["']"#,
            min_length: Some(16),
            validator: Validator::Generic,
            recommendation: "Move the key into a secret manager or environment variable",
        },
        Entry {
            name: "generic_secret",
            category: "generic",
            description: "Hard-coded secret assignment",
            severity: Severity::High,
            pattern: r#"(?:client[_\-]?secret|secret[_\-]?key|app[_\-]?secret)["']?\s*[:=]\s*["']([A-Za-z0-9_\-]{16,64})["']"#,
            min_length: Some(16),
            validator: Validator::Generic,
            recommendation: "Move the secret into a secret manager or environment variable",
        },
        Entry {
            name: "password_assignment",
            category: "generic",
            description: "Hard-coded password assignment",
            severity: Severity::Medium,
            pattern: r#"(?:password|passwd|pwd)["']?\s*[:=]\s*["']([^"']{8,64})["']"#,
            min_length: Some(8),
            validator: Validator::Generic,
            recommendation: "Remove the literal password and source it from the environment",
        },
        Entry {
            name: "bearer_token",
            category: "generic",
            description: "Hard-coded bearer token",
            severity: Severity::Medium,
            pattern: r#"bearer\s+([A-Za-z0-9_\-.=]{20,})"#,
            min_length: Some(20),
            validator: Validator::Generic,
            recommendation: "Issue short-lived tokens at runtime instead of embedding them",
        },
    ];

    entries.into_iter().map(SecretSignature::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builds_and_names_are_unique() {
        let signatures = builtin_signatures().unwrap();
        assert!(signatures.len() >= 35);

        let mut names: Vec<_> = signatures.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), signatures.len());
    }

    #[test]
    fn heroku_validator_never_confirms() {
        let signatures = builtin_signatures().unwrap();
        let heroku = signatures
            .iter()
            .find(|s| s.name == "heroku_api_key")
            .unwrap();
        assert_eq!(heroku.validator, Validator::NeverConfirm);
        assert!(!heroku.validator.confirm("12345678-1234-1234-1234-123456789012"));
    }

    #[test]
    fn mixed_classes_requires_letters_and_digits() {
        assert!(Validator::MixedClasses.confirm("abcDEF123456"));
        assert!(!Validator::MixedClasses.confirm("abcdefghijkl"));
        assert!(!Validator::MixedClasses.confirm("123456789012"));
    }

    #[test]
    fn specific_signatures_precede_generic_ones() {
        let signatures = builtin_signatures().unwrap();
        let stripe = signatures
            .iter()
            .position(|s| s.name == "stripe_api_key")
            .unwrap();
        let generic = signatures
            .iter()
            .position(|s| s.name == "generic_api_key")
            .unwrap();
        assert!(stripe < generic);
    }
}
