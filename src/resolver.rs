// src/resolver.rs

//! Template and package resolution
//!
//! Template resolution is pure name matching over a fetched template list.
//! Package resolution is the interactive part: a package missing from the
//! appliance's attached repositories triggers an operator-approved search
//! across every repository the service knows, and possibly attaches a new
//! one. Every remote mutation in here happens only after an explicit
//! operator decision.

use crate::api::StudioApi;
use crate::error::Result;
use crate::model::{Appliance, PackageCandidate, Template};
use crate::prompt::{MenuChoice, Prompter};
use tracing::info;

/// Pick the template matching a requested name and base system.
///
/// The base system must match exactly; the name matches as a
/// case-insensitive substring of the template's display name. The first
/// match in service order wins.
pub fn resolve_template<'a>(
    templates: &'a [Template],
    name: &str,
    basesystem: &str,
) -> Option<&'a Template> {
    let needle = name.to_lowercase();
    templates
        .iter()
        .find(|t| t.basesystem == basesystem && t.name.to_lowercase().contains(&needle))
}

/// Templates available for a base system, for the "no match" diagnostic.
///
/// Compared case-insensitively, unlike resolution itself: this listing is
/// a hint for the operator, not a fallback choice.
pub fn templates_for_basesystem<'a>(
    templates: &'a [Template],
    basesystem: &str,
) -> Vec<&'a Template> {
    let needle = basesystem.to_lowercase();
    templates
        .iter()
        .filter(|t| t.basesystem.to_lowercase() == needle)
        .collect()
}

/// Distinct base systems offered by the template set, sorted.
pub fn basesystems(templates: &[Template]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for template in templates {
        if !found.contains(&template.basesystem) {
            found.push(template.basesystem.clone());
        }
    }
    found.sort();
    found
}

/// How an attempted package add ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Found in an attached repository and added.
    Added,
    /// Added after attaching the repository the operator chose.
    AddedFromNewRepository { repo_id: String },
    /// The operator declined the broadened search or the repository menu.
    Declined,
    /// No repository for the appliance's base system offers the package.
    NoCompatibleRepository,
}

/// A repository offering a searched package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryChoice {
    pub id: String,
    pub name: String,
}

/// Interactive package and repository resolution against one appliance.
pub struct PackageResolver<'a> {
    api: &'a dyn StudioApi,
    prompter: &'a dyn Prompter,
}

impl<'a> PackageResolver<'a> {
    pub fn new(api: &'a dyn StudioApi, prompter: &'a dyn Prompter) -> Self {
        Self { api, prompter }
    }

    /// Add one package, broadening the repository search when needed.
    ///
    /// The flow, in order: search the attached repositories and add on an
    /// exact name hit; otherwise offer a search across all repositories;
    /// filter the hits to repositories matching the appliance's base
    /// system; let the operator pick one; attach it; add the package.
    /// A declined question returns without having mutated anything.
    pub fn add_package(&self, appliance: &Appliance, name: &str) -> Result<AddOutcome> {
        let attached = self.api.search_software(&appliance.id, name, false)?;
        if attached.iter().any(|candidate| candidate.name == name) {
            self.api.add_package(&appliance.id, name)?;
            info!("Added package {} to appliance {}", name, appliance.id);
            return Ok(AddOutcome::Added);
        }

        println!("Package '{name}' was not found in the appliance repositories.");
        if !self
            .prompter
            .ask_yes_no("Search for it in all known repositories?")?
        {
            return Ok(AddOutcome::Declined);
        }

        let everywhere = self.api.search_software(&appliance.id, name, true)?;
        let repos = compatible_repositories(&everywhere, name, &appliance.basesystem);
        if repos.is_empty() {
            println!(
                "Package '{}' is not available in any repository for base system {}.",
                name, appliance.basesystem
            );
            println!("Try the package search in the build service web interface.");
            return Ok(AddOutcome::NoCompatibleRepository);
        }

        let entries: Vec<String> = repos
            .iter()
            .map(|repo| format!("{} ({})", repo.name, repo.id))
            .collect();
        let choice = self.prompter.ask_menu(
            &format!("Repositories providing '{name}':"),
            &entries,
            false,
        )?;
        let repo = match choice {
            MenuChoice::Item(index) => &repos[index],
            MenuChoice::All | MenuChoice::None => return Ok(AddOutcome::Declined),
        };

        self.api.add_repository(&appliance.id, &repo.id)?;
        self.api.add_package(&appliance.id, name)?;
        info!(
            "Added package {} to appliance {} via repository {}",
            name, appliance.id, repo.id
        );
        Ok(AddOutcome::AddedFromNewRepository {
            repo_id: repo.id.clone(),
        })
    }

    /// Remove one package. Removal needs no repository discovery.
    pub fn rm_package(&self, appliance: &Appliance, name: &str) -> Result<()> {
        self.api.remove_package(&appliance.id, name)?;
        info!("Removed package {} from appliance {}", name, appliance.id);
        Ok(())
    }
}

/// Distinct repositories offering an exact-name hit for the given base
/// system, in the order the service returned them.
fn compatible_repositories(
    candidates: &[PackageCandidate],
    name: &str,
    basesystem: &str,
) -> Vec<RepositoryChoice> {
    let mut repos: Vec<RepositoryChoice> = Vec::new();
    for candidate in candidates {
        if candidate.name != name || candidate.basesystem != basesystem {
            continue;
        }
        if repos.iter().any(|repo| repo.id == candidate.repo_id) {
            continue;
        }
        repos.push(RepositoryChoice {
            id: candidate.repo_id.clone(),
            name: candidate.repo_name.clone(),
        });
    }
    repos
}
