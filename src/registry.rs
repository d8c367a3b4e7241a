//! Registry of monitored targets
//!
//! The registry is built once at startup (from the configuration file or the
//! compiled-in list) and shared read-only between sweeps.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One monitored endpoint with its probe and metadata links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Display name, unique under case-insensitive comparison
    pub name: String,

    /// URL used for reachability checks (falls back to `url`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    /// Canonical public URL
    pub url: String,

    /// Admin console
    pub admin_url: String,

    /// Operational dashboard
    pub dashboard_url: String,
}

impl Target {
    pub fn new(
        name: impl ToString,
        url: impl ToString,
        admin_url: impl ToString,
        dashboard_url: impl ToString,
    ) -> Self {
        Self {
            name: name.to_string(),
            probe_url: None,
            url: url.to_string(),
            admin_url: admin_url.to_string(),
            dashboard_url: dashboard_url.to_string(),
        }
    }

    pub fn with_probe_url(mut self, probe_url: impl ToString) -> Self {
        self.probe_url = Some(probe_url.to_string());
        self
    }

    /// The URL a probe should hit
    pub fn check_url(&self) -> &str {
        self.probe_url.as_deref().unwrap_or(&self.url)
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Reasons a list of targets cannot form a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    EmptyName,
    DuplicateName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "target names must not be empty"),
            RegistryError::DuplicateName(name) => {
                write!(f, "target name '{}' is used more than once", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Ordered, immutable list of targets
#[derive(Debug, Clone)]
pub struct Registry {
    targets: Vec<Target>,
}

impl Registry {
    pub fn new(targets: Vec<Target>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for target in &targets {
            if target.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(target.name.to_lowercase()) {
                return Err(RegistryError::DuplicateName(target.name.clone()));
            }
        }

        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Look up a target by name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.is_named(name))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The compiled-in production registry
    pub fn builtin() -> Self {
        const DREAMHOST: &str = "https://panel.dreamhost.com/index.cgi?tree=domain.dashboard#/site";
        const DROPLET: &str =
            "https://cloud.digitalocean.com/droplets/505867845/graphs?i=176df9&period=hour";
        const PROGRAM_SITES: &str = "https://github.com/uie-admin/program-sites";
        const ASSET_NOTES: &str = "https://www.notion.so/centercentre/PDF-Image-Hosting-201903316fdd8067ac01d1cd3b8dd980?source=copy_link";

        let targets = vec![
            Target::new(
                "CC Home",
                "https://centercentre.com",
                "https://centercentre.com/wp-admin",
                format!("{DREAMHOST}/centercentre.com/dashboard"),
            ),
            Target::new(
                "Articles",
                "https://articles.centercentre.com",
                "https://articles.centercentre.com/wp-admin",
                format!("{DREAMHOST}/articles.centercentre.com/dashboard"),
            ),
            Target::new("UIE Assets", "https://asset.uie.com/", ASSET_NOTES, ASSET_NOTES)
                .with_probe_url(
                    "https://asset.uie.com/pdf/2025-07-07-Why-Designing-for-GenAI-is-Different.pdf",
                ),
            Target::new(
                "Forms",
                "https://form.centercentre.com/home",
                "https://form.centercentre.com/home",
                DROPLET,
            )
            .with_probe_url("https://form.centercentre.com/forms/contact"),
            Target::new(
                "Visions",
                "https://visions.centercentre.com",
                PROGRAM_SITES,
                "https://app.netlify.com/projects/ux-vision/overview",
            ),
            Target::new(
                "Metrics",
                "https://metrics.centercentre.com",
                PROGRAM_SITES,
                "https://app.netlify.com/projects/ux-metrics-center-centre/overview",
            ),
            Target::new(
                "Research",
                "https://research.centercentre.com",
                PROGRAM_SITES,
                "https://app.netlify.com/projects/ux-research-center-centre/overview",
            ),
            Target::new(
                "Win Stakeholders",
                "https://research.centercentre.com",
                PROGRAM_SITES,
                "https://app.netlify.com/projects/winstakeholders/overview",
            ),
            Target::new(
                "GCal Service",
                "https://gcal.centercentre.com",
                "https://github.com/alextyang/gcal-sync",
                DROPLET,
            ),
            Target::new(
                "Postmark Email Server",
                "https://postmark.centercentre.com",
                "https://github.com/alextyang/postmark-scheduler",
                DROPLET,
            ),
            Target::new(
                "PDF Service",
                "https://pdf.centercentre.com",
                "https://github.com/alextyang/cc-pdf",
                "https://app.netlify.com/projects/uie-pdf/overview",
            )
            .with_probe_url("https://pdf.centercentre.com/create"),
            Target::new(
                "Airtable Middleman",
                "https://airtable.centercentre.com",
                "https://github.com/alextyang/airtable-cache",
                DROPLET,
            )
            .with_probe_url(
                "https://airtable.centercentre.com/v0/appHcZTzlfXAJpL7I/tblm2TqCcDcx94nA2?filterByFormula=OR(FIND(%27Cohort%2010%27%2C%20ARRAYJOIN(%7BCohort%7D%2C%20%27%2C%27))%20%3E%200%2C%20%7BCohort%7D%20%3D%20%27Cohort%2010%27%2CFIND(%27Cohort%2011%27%2C%20ARRAYJOIN(%7BCohort%7D%2C%20%27%2C%27))%20%3E%200%2C%20%7BCohort%7D%20%3D%20%27Cohort%2011%27%2CFIND(%27Cohort%2012%27%2C%20ARRAYJOIN(%7BCohort%7D%2C%20%27%2C%27))%20%3E%200%2C%20%7BCohort%7D%20%3D%20%27Cohort%2012%27)",
            ),
        ];

        Self { targets }
    }
}
