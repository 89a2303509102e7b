//! Next version calculation from changesets and overrides.
use log::*;
use semver::{BuildMetadata, Prerelease, Version};
use std::{fmt::Display, str::FromStr};

use crate::{
    analyzer::{
        commit::CommitType,
        release::{Changeset, Tag},
    },
    result::Result,
};

/// Version proposed when the repository has never been released.
pub const INITIAL_VERSION: Version = Version::new(0, 1, 0);

/// Size of a semantic version increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NextVersionType {
    Patch,
    Minor,
    Major,
}

impl FromStr for NextVersionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(format!("unknown version type: {other}")),
        }
    }
}

impl Display for NextVersionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => f.write_str("patch"),
            Self::Minor => f.write_str("minor"),
            Self::Major => f.write_str("major"),
        }
    }
}

/// The version a release pull request proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextVersion {
    pub semver: Version,
    /// `semver` with the configured tag prefix, e.g. `v1.3.0`.
    pub tag_name: String,
}

impl Display for NextVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag_name)
    }
}

/// Derive the bump implied by the analyzed commits of all changesets.
/// Breaking beats feat beats fix; anything else is not releasable.
pub fn bump_from_changesets(
    changesets: &[Changeset],
) -> Option<NextVersionType> {
    let entries = changesets.iter().flat_map(|c| c.entries());

    let mut bump = None;

    for entry in entries {
        let entry_bump = if entry.breaking {
            Some(NextVersionType::Major)
        } else {
            match entry.commit_type {
                CommitType::Feat => Some(NextVersionType::Minor),
                CommitType::Fix => Some(NextVersionType::Patch),
                CommitType::Other(_) => None,
            }
        };

        bump = bump.max(entry_bump);
    }

    bump
}

/// Apply `bump` to `current`, resetting lower components and dropping any
/// prerelease or build metadata.
pub fn increment(current: &Version, bump: NextVersionType) -> Version {
    let mut next = current.clone();
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;

    match bump {
        NextVersionType::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        NextVersionType::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        NextVersionType::Patch => {
            next.patch += 1;
        }
    }

    next
}

/// Compute the next version. Returns `Ok(None)` when nothing releasable
/// happened since `tag` and no override was given.
pub fn next_version(
    tag: Option<&Tag>,
    changesets: &[Changeset],
    override_type: Option<NextVersionType>,
    tag_prefix: &str,
) -> Result<Option<NextVersion>> {
    let bump = match override_type {
        Some(forced) => {
            info!("using version type override: {forced}");
            Some(forced)
        }
        None => bump_from_changesets(changesets),
    };

    let Some(bump) = bump else {
        info!("no releasable changes found");
        return Ok(None);
    };

    let semver = match tag {
        Some(tag) => {
            let current = tag.semver(tag_prefix)?;
            let next = increment(&current, bump);
            debug!("bumping {current} by {bump} to {next}");
            next
        }
        None => {
            debug!("no previous release: starting at {INITIAL_VERSION}");
            INITIAL_VERSION
        }
    };

    Ok(Some(NextVersion {
        tag_name: format!("{tag_prefix}{semver}"),
        semver,
    }))
}
