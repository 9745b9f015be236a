//! Groups of inputs and results inside a single HDF5 container.
//!
//! Each [`Category`] is a top-level section of the file. A section holds any
//! number of groups named `<type>-<qid>` and an `active` attribute naming the
//! group the next simulation will read. The container is opened for the
//! duration of a single operation only; [`Store`] itself just remembers the path.

mod attrs;
mod category;
mod metadata;
mod payload;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::Error;

pub(crate) use attrs::{read_string_attr_opt, write_string_attr};
pub use category::{Category, ParseCategoryError};
pub use metadata::{GroupMeta, QID_DIGITS};
pub use payload::{Column, Payload, Values};

const ACTIVE_ATTR: &str = "active";

/// A stored group: its metadata and numeric body.
#[derive(Clone, Debug)]
pub struct GroupData {
    pub meta: GroupMeta,
    pub payload: Payload,
}

/// One entry of a section listing.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub meta: GroupMeta,
    pub active: bool,
}

/// Handle to a container file.
///
/// Writers must be serialized by the caller; concurrent readers are fine.
#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Creates a new, empty container, replacing any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        hdf5::File::create(&path)?;
        info!(path = %path.display(), "created container");
        Ok(Self { path })
    }

    /// Opens an existing container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        hdf5::File::open(&path)?;
        Ok(Self { path })
    }

    /// Opens an existing container or creates a new one.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn read_file(&self) -> Result<hdf5::File, Error> {
        Ok(hdf5::File::open(&self.path)?)
    }

    pub(crate) fn write_file(&self) -> Result<hdf5::File, Error> {
        Ok(hdf5::File::open_rw(&self.path)?)
    }

    /// Stores a new group and returns its freshly allocated identifier.
    ///
    /// The new group becomes the active one of its category.
    pub fn create_group(
        &self,
        category: Category,
        type_name: &str,
        payload: &Payload,
        description: Option<&str>,
    ) -> Result<String, Error> {
        let file = self.write_file()?;
        let qid = fresh_qid(&file)?;
        insert_group(&file, category, type_name, &qid, description, |group| payload.write(group))
    }

    /// Stores a new group under a caller-chosen identifier.
    pub fn create_group_with_qid(
        &self,
        category: Category,
        type_name: &str,
        qid: &str,
        payload: &Payload,
        description: Option<&str>,
    ) -> Result<String, Error> {
        if qid.is_empty() || qid.contains(|c| c == '-' || c == '/') {
            return Err(Error::Malformed(format!("\"{}\" is not a valid identifier", qid)));
        }
        let file = self.write_file()?;
        if all_qids(&file)?.contains(qid) {
            return Err(Error::DuplicateIdentifier(qid.to_string()));
        }
        insert_group(&file, category, type_name, qid, description, |group| payload.write(group))
    }

    /// Reads the metadata and payload of a group.
    pub fn read_group(&self, category: Category, qid: &str) -> Result<GroupData, Error> {
        let file = self.read_file()?;
        let (meta, group) = find_group(&file, category, qid)?;
        debug!(%category, qid, "reading group");
        Ok(GroupData { meta, payload: Payload::read(&group)? })
    }

    /// Lists the groups of a category, oldest first.
    pub fn list_groups(&self, category: Category) -> Result<Vec<GroupSummary>, Error> {
        let file = self.read_file()?;
        let active = active_qid(&file, category)?;
        Ok(section_metas(&file, category)?
            .into_iter()
            .map(|meta| {
                let active = active.as_deref() == Some(meta.qid.as_str());
                GroupSummary { meta, active }
            })
            .collect())
    }

    /// Makes the group the only active one in its category.
    pub fn activate(&self, category: Category, qid: &str) -> Result<(), Error> {
        let file = self.write_file()?;
        find_group(&file, category, qid)?;
        let section = file.group(category.section())?;
        write_string_attr(&section, ACTIVE_ATTR, qid)?;
        info!(%category, qid, "activated group");
        Ok(())
    }

    /// Leaves the category without an active group.
    pub fn deactivate(&self, category: Category) -> Result<(), Error> {
        let file = self.write_file()?;
        if file.link_exists(category.section()) {
            write_string_attr(&file.group(category.section())?, ACTIVE_ATTR, "")?;
        }
        Ok(())
    }

    /// Identifier of the active group of a category, if any.
    pub fn active(&self, category: Category) -> Result<Option<String>, Error> {
        active_qid(&self.read_file()?, category)
    }

    /// Resolves an identifier, description or description tag to an identifier.
    ///
    /// An identifier match wins outright. Otherwise the most recently created
    /// group with exactly this description is chosen, and only when there is
    /// none, the most recent one whose derived tag matches.
    pub fn resolve(&self, category: Category, tag: &str) -> Result<String, Error> {
        let metas = section_metas(&self.read_file()?, category)?;
        metas
            .iter()
            .find(|meta| meta.qid == tag)
            .or_else(|| {
                metas
                    .iter()
                    .rev()
                    .find(|meta| !tag.is_empty() && meta.description == tag)
            })
            .or_else(|| metas.iter().rev().find(|meta| meta.matches(tag)))
            .map(|meta| meta.qid.clone())
            .ok_or_else(|| Error::AmbiguousOrNotFound { category, tag: tag.to_string() })
    }

    /// Whether `resolve` would succeed.
    pub fn contains(&self, category: Category, tag: &str) -> Result<bool, Error> {
        match self.resolve(category, tag) {
            Ok(_) => Ok(true),
            Err(Error::AmbiguousOrNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Creates a new group, lets `fill` write its body, then writes its metadata
/// and makes it active. A group whose writes fail is removed again.
pub(crate) fn insert_group<F>(
    file: &hdf5::File,
    category: Category,
    type_name: &str,
    qid: &str,
    description: Option<&str>,
    fill: F,
) -> Result<String, Error>
where
    F: FnOnce(&hdf5::Group) -> Result<(), Error>,
{
    if type_name.is_empty() || type_name.contains('/') {
        return Err(Error::Malformed(format!("\"{}\" is not a valid group type", type_name)));
    }
    let meta = GroupMeta {
        category,
        type_name: type_name.to_string(),
        qid: qid.to_string(),
        description: description.unwrap_or("").to_string(),
        date: metadata::next_date(latest_date(file)?),
    };
    let section = ensure_section(file, category)?;
    let key = meta.key();
    let group = section.create_group(&key)?;
    if let Err(err) = fill(&group).and_then(|()| meta.write(&group)) {
        drop(group);
        if let Err(unlink_err) = section.unlink(&key) {
            warn!(%category, %key, error = %unlink_err, "could not remove incomplete group");
        }
        return Err(err);
    }
    write_string_attr(&section, ACTIVE_ATTR, qid)?;
    info!(%category, %key, description = %meta.description, "created group");
    Ok(meta.qid)
}

pub(crate) fn find_group(
    file: &hdf5::File,
    category: Category,
    qid: &str,
) -> Result<(GroupMeta, hdf5::Group), Error> {
    let not_found = || Error::NotFound {
        what: format!("{} group with identifier {}", category, qid),
    };
    if !file.link_exists(category.section()) {
        return Err(not_found());
    }
    let section = file.group(category.section())?;
    for key in section.member_names()? {
        if metadata::split_key(&key).map_or(false, |(_, member_qid)| member_qid == qid) {
            let group = section.group(&key)?;
            return Ok((GroupMeta::read(category, &key, &group)?, group));
        }
    }
    Err(not_found())
}

fn ensure_section(file: &hdf5::File, category: Category) -> Result<hdf5::Group, Error> {
    if file.link_exists(category.section()) {
        Ok(file.group(category.section())?)
    } else {
        let section = file.create_group(category.section())?;
        write_string_attr(&section, ACTIVE_ATTR, "")?;
        Ok(section)
    }
}

fn section_metas(file: &hdf5::File, category: Category) -> Result<Vec<GroupMeta>, Error> {
    if !file.link_exists(category.section()) {
        return Ok(Vec::new());
    }
    let section = file.group(category.section())?;
    let mut metas = section
        .member_names()?
        .iter()
        .map(|key| GroupMeta::read(category, key, &section.group(key)?))
        .collect::<Result<Vec<_>, Error>>()?;
    metas.sort_by_key(|meta| meta.date);
    Ok(metas)
}

pub(crate) fn active_qid(file: &hdf5::File, category: Category) -> Result<Option<String>, Error> {
    if !file.link_exists(category.section()) {
        return Ok(None);
    }
    let active = read_string_attr_opt(&file.group(category.section())?, ACTIVE_ATTR)?;
    Ok(active.filter(|qid| !qid.is_empty()))
}

/// Allocates an identifier unused anywhere in the file.
pub(crate) fn fresh_qid(file: &hdf5::File) -> Result<String, Error> {
    Ok(metadata::generate_qid(&mut rand::thread_rng(), &all_qids(file)?))
}

fn all_qids(file: &hdf5::File) -> Result<HashSet<String>, Error> {
    let mut qids = HashSet::new();
    for category in Category::ALL {
        if file.link_exists(category.section()) {
            for key in file.group(category.section())?.member_names()? {
                qids.insert(metadata::split_key(&key)?.1.to_string());
            }
        }
    }
    Ok(qids)
}

fn latest_date(file: &hdf5::File) -> Result<Option<DateTime<Utc>>, Error> {
    let mut latest = None;
    for category in Category::ALL {
        if let Some(meta) = section_metas(file, category)?.pop() {
            latest = latest.max(Some(meta.date));
        }
    }
    Ok(latest)
}
